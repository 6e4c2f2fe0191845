//! Exclusive, time-bounded claims on unspent outputs.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::wallet::UnspentOutput;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    pub txid: String,
    pub vout: u32,
}

impl LockKey {
    pub fn new(txid: &str, vout: u32) -> Self {
        Self {
            txid: txid.to_string(),
            vout,
        }
    }
}

impl From<&UnspentOutput> for LockKey {
    fn from(utxo: &UnspentOutput) -> Self {
        Self::new(&utxo.txid, utxo.vout)
    }
}

impl std::fmt::Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Lock table keyed by outpoint. Each operation holds the mutex only for its
/// own duration, so request tasks and the sweeper can call in concurrently.
#[derive(Debug)]
pub struct ReservationManager {
    locks: Mutex<HashMap<LockKey, Instant>>,
    timeout: Duration,
}

impl ReservationManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Returns false if the outpoint is already locked.
    pub fn try_lock(&self, txid: &str, vout: u32) -> bool {
        self.try_lock_at(LockKey::new(txid, vout), Instant::now())
    }

    fn try_lock_at(&self, key: LockKey, at: Instant) -> bool {
        let mut locks = self.locks.lock();
        if locks.contains_key(&key) {
            return false;
        }
        tracing::debug!("Locked {}", key);
        locks.insert(key, at);
        true
    }

    /// Unknown or already released outpoints are ignored.
    pub fn unlock_many(&self, outputs: &[UnspentOutput]) {
        if outputs.is_empty() {
            return;
        }
        let mut locks = self.locks.lock();
        for utxo in outputs {
            locks.remove(&LockKey::from(utxo));
        }
    }

    /// Releases every lock older than the timeout and returns how many went.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let mut locks = self.locks.lock();
        let before = locks.len();
        locks.retain(|key, locked_at| {
            let expired = now.saturating_duration_since(*locked_at) > self.timeout;
            if expired {
                tracing::info!("Lock on {} expired, releasing", key);
            }
            !expired
        });
        before - locks.len()
    }

    pub fn is_locked(&self, txid: &str, vout: u32) -> bool {
        self.locks.lock().contains_key(&LockKey::new(txid, vout))
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Outputs locked for one send. Dropping the guard unlocks them, so every
/// exit path releases the reservation, including cancellation of the task.
#[derive(Debug)]
pub struct Reservation {
    manager: Arc<ReservationManager>,
    outputs: Vec<UnspentOutput>,
    total: i64,
}

impl Reservation {
    pub fn new(manager: Arc<ReservationManager>) -> Self {
        Self {
            manager,
            outputs: Vec::new(),
            total: 0,
        }
    }

    /// Claims the output if nobody else holds it.
    pub fn claim(&mut self, utxo: UnspentOutput) -> bool {
        if !self.manager.try_lock(&utxo.txid, utxo.vout) {
            return false;
        }
        self.total += utxo.amount;
        self.outputs.push(utxo);
        true
    }

    pub fn outputs(&self) -> &[UnspentOutput] {
        &self.outputs
    }

    pub fn total(&self) -> i64 {
        self.total
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.manager.unlock_many(&self.outputs);
    }
}
