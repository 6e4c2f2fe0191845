use std::sync::Arc;

use crate::error::{NodeError, Result};
use crate::services::exchanger::Exchanger;
use crate::services::ledger::LedgerGateway;
use crate::services::onchain::{TransactionAssembler, TxBuildRequest, TxOutput, UtxoSelector};
use crate::storage::{AssetRegistry, QuotationStore, Reservation, ReservationManager, ResolvedOffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStage {
    Requested,
    Reserved,
    Assembled,
    Signed,
    Submitted,
    Settled,
}

impl std::fmt::Display for SendStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SendStage::Requested => "requested",
            SendStage::Reserved => "reserved",
            SendStage::Assembled => "assembled",
            SendStage::Signed => "signed",
            SendStage::Submitted => "submitted",
            SendStage::Settled => "settled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub txid: String,
    pub change: i64,
}

/// Owns everything a send holds once its outputs are reserved. Dropping it
/// consumes the quotation and then unlocks the outputs.
struct Settlement {
    store: Arc<QuotationStore>,
    quotation_id: String,
    reservation: Reservation,
}

impl Drop for Settlement {
    fn drop(&mut self) {
        self.store.remove(&self.quotation_id);
    }
}

pub struct SendOrchestrator {
    ledger: Arc<dyn LedgerGateway>,
    exchanger: Arc<dyn Exchanger>,
    assembler: Arc<dyn TransactionAssembler>,
    selector: UtxoSelector,
    store: Arc<QuotationStore>,
    assets: Arc<AssetRegistry>,
    confidential: bool,
}

impl SendOrchestrator {
    pub fn new(
        ledger: Arc<dyn LedgerGateway>,
        exchanger: Arc<dyn Exchanger>,
        assembler: Arc<dyn TransactionAssembler>,
        reservations: Arc<ReservationManager>,
        store: Arc<QuotationStore>,
        assets: Arc<AssetRegistry>,
        confidential: bool,
    ) -> Self {
        Self {
            selector: UtxoSelector::new(ledger.clone(), reservations),
            ledger,
            exchanger,
            assembler,
            store,
            assets,
            confidential,
        }
    }

    /// Pays `address` through the offer `offer_id`.
    ///
    /// An unknown offer or insufficient funds fail without side effects.
    /// Past reservation every outcome consumes the quotation and unlocks
    /// the reserved outputs.
    pub async fn send(&self, offer_id: &str, address: &str) -> Result<SendReceipt> {
        let resolved = self
            .store
            .resolve(offer_id)
            .ok_or_else(|| failed(SendStage::Requested, NodeError::OfferNotFound(offer_id.to_string())))?;

        let required = resolved
            .offer
            .required()
            .map_err(|e| failed(SendStage::Requested, e))?;
        let reservation = self
            .selector
            .select_and_lock(&resolved.offer_asset, required)
            .await
            .map_err(|e| failed(SendStage::Requested, e))?;

        let settlement = Settlement {
            store: self.store.clone(),
            quotation_id: resolved.quotation_id.clone(),
            reservation,
        };

        let result = self
            .settle(&resolved, required, &settlement.reservation, address)
            .await;
        drop(settlement);
        result
    }

    async fn settle(
        &self,
        resolved: &ResolvedOffer,
        required: i64,
        reservation: &Reservation,
        address: &str,
    ) -> Result<SendReceipt> {
        let request = self
            .build_request(resolved, required, reservation, address)
            .await
            .map_err(|e| failed(SendStage::Reserved, e))?;

        let template = self
            .assembler
            .assemble(&request)
            .await
            .map_err(|e| failed(SendStage::Reserved, e))?;
        tracing::debug!("Offer {} {}", resolved.offer.id, SendStage::Assembled);

        let signed = self
            .ledger
            .sign_raw_transaction(&template)
            .await
            .map_err(|e| failed(SendStage::Assembled, e))?;
        if !signed.complete {
            tracing::warn!("Offer {}: ledger reports an incomplete signature", resolved.offer.id);
        }
        tracing::debug!("Offer {} {}", resolved.offer.id, SendStage::Signed);

        let submitted = self
            .exchanger
            .submit_exchange(&signed.hex)
            .await
            .map_err(|e| failed(SendStage::Signed, e))?;
        tracing::debug!("Offer {} {}", resolved.offer.id, SendStage::Submitted);

        tracing::info!(
            "Offer {} {}: paid {} {} to {} for {} {} (txid {})",
            resolved.offer.id,
            SendStage::Settled,
            resolved.request_amount,
            resolved.request_asset,
            address,
            required,
            resolved.offer_asset,
            submitted.txid
        );

        Ok(SendReceipt {
            txid: submitted.txid,
            change: request.change.map(|c| c.amount).unwrap_or(0),
        })
    }

    async fn build_request(
        &self,
        resolved: &ResolvedOffer,
        required: i64,
        reservation: &Reservation,
        address: &str,
    ) -> Result<TxBuildRequest> {
        let offer = &resolved.offer;
        let offer_asset_id = self.asset_id(&resolved.offer_asset)?;
        let request_asset_id = self.asset_id(&resolved.request_asset)?;

        let change_amount = reservation.total().checked_sub(required).ok_or_else(|| {
            NodeError::InvalidOffer(format!(
                "change for {} reserved against {} overflows",
                reservation.total(),
                required
            ))
        })?;
        let change = if change_amount > 0 {
            let change_address = self.ledger.get_new_address(self.confidential).await?;
            Some(TxOutput {
                amount: change_amount,
                address: change_address,
                asset_id: offer_asset_id.clone(),
            })
        } else {
            None
        };

        Ok(TxBuildRequest {
            template: offer.transaction.clone(),
            inputs: reservation.outputs().to_vec(),
            change,
            payment: TxOutput {
                amount: resolved.request_amount,
                address: address.to_string(),
                asset_id: request_asset_id,
            },
            fee: offer.fee,
            fee_asset_id: offer_asset_id,
        })
    }

    fn asset_id(&self, label: &str) -> Result<String> {
        self.assets
            .asset_id(label)
            .map(str::to_string)
            .ok_or_else(|| NodeError::UnknownAsset(label.to_string()))
    }
}

fn failed(stage: SendStage, e: NodeError) -> NodeError {
    tracing::error!("Send failed after stage {}: {}", stage, e);
    e
}
