pub mod exchanger;
pub mod ledger;
pub mod offer;
pub mod onchain;
pub mod send;
pub mod sweeper;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::error::Result;
use crate::storage::{AssetRegistry, QuotationStore, ReservationManager};
use exchanger::{Exchanger, ExchangerClient};
use ledger::{LedgerGateway, LedgerRpcClient};
use offer::OfferNegotiator;
use onchain::{ElementsTxBuilder, TransactionAssembler};
use send::SendOrchestrator;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub negotiator: Arc<OfferNegotiator>,
    pub orchestrator: Arc<SendOrchestrator>,
    pub reservations: Arc<ReservationManager>,
    pub store: Arc<QuotationStore>,
}

impl AppState {
    pub async fn new(settings: &Settings) -> Result<Self> {
        let ledger: Arc<dyn LedgerGateway> = Arc::new(LedgerRpcClient::new(
            &settings.rpc_url,
            &settings.rpc_user,
            &settings.rpc_pass,
            settings.rpc_timeout,
        )?);

        let exchanger_url = settings.exchanger_base_url();
        tracing::info!("Exchanger at {}", exchanger_url);
        let exchanger: Arc<dyn Exchanger> =
            Arc::new(ExchangerClient::new(&exchanger_url, settings.exchanger_timeout)?);

        let assembler: Arc<dyn TransactionAssembler> = Arc::new(ElementsTxBuilder::new(
            &settings.tx_path,
            &settings.tx_option,
            settings.tx_builder_timeout,
        ));

        let assets = load_assets(ledger.as_ref()).await;

        Ok(Self::from_parts(
            ledger,
            exchanger,
            assembler,
            assets,
            settings.lock_timeout,
            settings.confidential,
        ))
    }

    pub fn from_parts(
        ledger: Arc<dyn LedgerGateway>,
        exchanger: Arc<dyn Exchanger>,
        assembler: Arc<dyn TransactionAssembler>,
        assets: AssetRegistry,
        lock_timeout: Duration,
        confidential: bool,
    ) -> Self {
        let assets = Arc::new(assets);
        let reservations = Arc::new(ReservationManager::new(lock_timeout));
        let store = Arc::new(QuotationStore::new());

        let negotiator = Arc::new(OfferNegotiator::new(
            ledger.clone(),
            exchanger.clone(),
            store.clone(),
            assets.clone(),
        ));
        let orchestrator = Arc::new(SendOrchestrator::new(
            ledger,
            exchanger,
            assembler,
            reservations.clone(),
            store.clone(),
            assets,
            confidential,
        ));

        Self {
            negotiator,
            orchestrator,
            reservations,
            store,
        }
    }
}

/// Builds the asset allow-list from the ledger's labels. A failure leaves
/// the node with no recognized assets rather than aborting startup.
pub async fn load_assets(ledger: &dyn LedgerGateway) -> AssetRegistry {
    match ledger.dump_asset_labels().await {
        Ok(labels) => {
            let assets = AssetRegistry::from_labels(labels);
            tracing::info!("Recognized {} asset label(s)", assets.len());
            assets
        }
        Err(e) => {
            tracing::error!("RPC/dumpassetlabels error: {}", e);
            AssetRegistry::default()
        }
    }
}
