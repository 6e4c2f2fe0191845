use futures::future::join_all;
use std::sync::Arc;

use crate::error::Result;
use crate::models::offer::{coarse_now, derive_offer_id, OfferByAsset, Quotation, UserOfferResponse};
use crate::models::wallet::Balance;
use crate::services::exchanger::Exchanger;
use crate::services::ledger::LedgerGateway;
use crate::storage::{AssetRegistry, QuotationStore};

/// Source of the coarse timestamp mixed into offer and quotation ids.
pub type CoarseClock = fn() -> i64;

pub struct OfferNegotiator {
    ledger: Arc<dyn LedgerGateway>,
    exchanger: Arc<dyn Exchanger>,
    store: Arc<QuotationStore>,
    assets: Arc<AssetRegistry>,
    clock: CoarseClock,
}

impl OfferNegotiator {
    pub fn new(
        ledger: Arc<dyn LedgerGateway>,
        exchanger: Arc<dyn Exchanger>,
        store: Arc<QuotationStore>,
        assets: Arc<AssetRegistry>,
    ) -> Self {
        Self {
            ledger,
            exchanger,
            store,
            assets,
            clock: coarse_now,
        }
    }

    pub fn with_clock(mut self, clock: CoarseClock) -> Self {
        self.clock = clock;
        self
    }

    /// Wallet balance restricted to recognized assets.
    pub async fn balance(&self) -> Result<Balance> {
        let wallet = self.ledger.get_wallet_info().await?;
        let mut balance = wallet.balance;
        self.assets.retain_known(&mut balance);
        Ok(balance)
    }

    /// Asks the exchanger for a price in every other held asset.
    ///
    /// Assets the exchanger fails to price are left out of the table. A
    /// quotation is stored only when at least one offer came back.
    pub async fn request_offers(
        &self,
        request_asset: &str,
        request_amount: i64,
    ) -> Result<UserOfferResponse> {
        let balance = self.balance().await?;

        let candidates: Vec<&String> = balance
            .keys()
            .filter(|asset| asset.as_str() != request_asset)
            .collect();

        let replies = join_all(candidates.iter().map(|offer_asset| {
            self.exchanger
                .get_exchange_offer(request_asset, request_amount, offer_asset)
        }))
        .await;

        let mut quotation = Quotation::new(request_asset, request_amount);
        for (offer_asset, reply) in candidates.into_iter().zip(replies) {
            let offer = match reply {
                Ok(offer) => offer,
                Err(e) => {
                    tracing::warn!("No offer for {} in exchange of {}: {}", offer_asset, request_asset, e);
                    continue;
                }
            };

            let offer_by_asset = OfferByAsset {
                fee: offer.fee,
                cost: offer.cost,
                id: derive_offer_id(&offer.transaction, (self.clock)()),
                transaction: offer.transaction,
            };
            if let Err(e) = offer_by_asset.required() {
                tracing::warn!("Dropping offer for {} in exchange of {}: {}", offer_asset, request_asset, e);
                continue;
            }
            quotation.offers.insert(offer_asset.clone(), offer_by_asset);
        }

        let response: UserOfferResponse = quotation.offers.clone();
        if !quotation.is_empty() {
            let id = quotation.derive_id((self.clock)());
            tracing::info!(
                "Stored quotation {} with {} offer(s) for {} {}",
                id,
                quotation.offers.len(),
                request_amount,
                request_asset
            );
            self.store.insert(id, quotation);
        }

        Ok(response)
    }
}
