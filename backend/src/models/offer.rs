use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::error::{NodeError, Result};

/// One priced counter-offer. The transaction template never leaves the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferByAsset {
    pub fee: i64,
    pub cost: i64,
    pub id: String,
    #[serde(skip)]
    pub transaction: String,
}

impl OfferByAsset {
    /// Amount of the offer asset the payment must cover: `cost + fee`.
    /// Cost must be positive and fee non-negative.
    pub fn required(&self) -> Result<i64> {
        if self.cost <= 0 || self.fee < 0 {
            return Err(NodeError::InvalidOffer(format!(
                "cost {} and fee {} out of range",
                self.cost, self.fee
            )));
        }
        self.cost
            .checked_add(self.fee)
            .ok_or_else(|| NodeError::InvalidOffer(format!("cost {} + fee {} overflows", self.cost, self.fee)))
    }
}

/// Offer asset label -> offer, as returned by `/offer`.
pub type UserOfferResponse = BTreeMap<String, OfferByAsset>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quotation {
    pub request_asset: String,
    pub request_amount: i64,
    pub offers: BTreeMap<String, OfferByAsset>,
}

impl Quotation {
    pub fn new(request_asset: impl Into<String>, request_amount: i64) -> Self {
        Self {
            request_asset: request_asset.into(),
            request_amount,
            offers: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// Hash of the coarse timestamp followed by every offer id, in asset order.
    pub fn derive_id(&self, now: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(now.to_be_bytes());
        for offer in self.offers.values().filter(|o| !o.id.is_empty()) {
            hasher.update(offer.id.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Hash of the transaction template followed by the coarse timestamp.
pub fn derive_offer_id(transaction: &str, now: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(transaction.as_bytes());
    hasher.update(now.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Whole seconds since the epoch; ids collide only within the same second.
pub fn coarse_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSendResponse {
    pub result: bool,
    pub message: String,
}
