use std::sync::Arc;

use crate::error::{NodeError, Result};
use crate::services::ledger::{LedgerGateway, MAX_CONFIRMATIONS, MIN_CONFIRMATIONS};
use crate::storage::{Reservation, ReservationManager};

pub struct UtxoSelector {
    ledger: Arc<dyn LedgerGateway>,
    reservations: Arc<ReservationManager>,
}

impl UtxoSelector {
    pub fn new(ledger: Arc<dyn LedgerGateway>, reservations: Arc<ReservationManager>) -> Self {
        Self {
            ledger,
            reservations,
        }
    }

    /// Locks unspent outputs of `asset` until their sum strictly exceeds `required`.
    ///
    /// Largest-first, skipping outputs the wallet cannot spend and outputs
    /// another selection already holds. On failure nothing stays locked.
    pub async fn select_and_lock(&self, asset: &str, required: i64) -> Result<Reservation> {
        let mut utxos = self
            .ledger
            .list_unspent(MIN_CONFIRMATIONS, MAX_CONFIRMATIONS, &[], asset)
            .await?;

        // largest first selection
        utxos.sort_by(|a, b| b.amount.cmp(&a.amount));

        let mut reservation = Reservation::new(self.reservations.clone());
        for utxo in utxos {
            if reservation.total() > required {
                break;
            }
            if !utxo.is_usable() {
                continue;
            }
            // a refused claim means a concurrent selection holds the output
            reservation.claim(utxo);
        }

        if reservation.total() <= required {
            let available = reservation.total();
            // rollback happens when the reservation drops
            drop(reservation);
            tracing::error!(
                "no sufficient utxo found for {}: need more than {}, reserved {}",
                asset,
                required,
                available
            );
            return Err(NodeError::InsufficientFunds {
                asset: asset.to_string(),
                required,
                available,
            });
        }

        tracing::info!(
            "Selected {} UTXOs totaling {} of {} for target {}",
            reservation.outputs().len(),
            reservation.total(),
            asset,
            required
        );

        Ok(reservation)
    }
}
