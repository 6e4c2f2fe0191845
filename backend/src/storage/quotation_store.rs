//! In-memory quotation map with an offer-id index for resolving `/send`.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::models::offer::{OfferByAsset, Quotation};

/// Everything a send needs to know about one selected offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOffer {
    pub quotation_id: String,
    pub request_asset: String,
    pub request_amount: i64,
    pub offer_asset: String,
    pub offer: OfferByAsset,
}

#[derive(Default)]
struct Inner {
    quotations: HashMap<String, Quotation>,
    // offer id -> quotation id
    offer_index: HashMap<String, String>,
}

impl Inner {
    fn unindex(&mut self, quotation_id: &str, quotation: &Quotation) {
        for offer in quotation.offers.values() {
            if self.offer_index.get(&offer.id).map(String::as_str) == Some(quotation_id) {
                self.offer_index.remove(&offer.id);
            }
        }
    }
}

#[derive(Default)]
pub struct QuotationStore {
    inner: RwLock<Inner>,
}

impl QuotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the quotation under `id`. A colliding id overwrites the earlier
    /// quotation and drops its index entries.
    pub fn insert(&self, id: String, quotation: Quotation) -> Option<Quotation> {
        let mut inner = self.inner.write();

        let replaced = inner.quotations.remove(&id);
        if let Some(old) = &replaced {
            tracing::warn!("Quotation id collision on {}, overwriting", id);
            inner.unindex(&id, old);
        }

        for offer in quotation.offers.values() {
            inner.offer_index.insert(offer.id.clone(), id.clone());
        }
        inner.quotations.insert(id, quotation);

        replaced
    }

    pub fn resolve(&self, offer_id: &str) -> Option<ResolvedOffer> {
        let inner = self.inner.read();
        let quotation_id = inner.offer_index.get(offer_id)?;
        let quotation = inner.quotations.get(quotation_id)?;
        let (offer_asset, offer) = quotation
            .offers
            .iter()
            .find(|(_, offer)| offer.id == offer_id)?;

        Some(ResolvedOffer {
            quotation_id: quotation_id.clone(),
            request_asset: quotation.request_asset.clone(),
            request_amount: quotation.request_amount,
            offer_asset: offer_asset.clone(),
            offer: offer.clone(),
        })
    }

    pub fn remove(&self, quotation_id: &str) -> Option<Quotation> {
        let mut inner = self.inner.write();
        let removed = inner.quotations.remove(quotation_id)?;
        inner.unindex(quotation_id, &removed);
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.inner.read().quotations.len()
    }
}
