//! Hand-written collaborator doubles shared by the service and API tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{NodeError, Result};
use crate::models::exchange::{ExchangeOfferResponse, SubmitExchangeResponse};
use crate::models::wallet::{Balance, SignedTransaction, UnspentOutput, WalletInfo};
use crate::services::exchanger::Exchanger;
use crate::services::ledger::LedgerGateway;
use crate::services::onchain::{TransactionAssembler, TxBuildRequest};

pub fn utxo(txid: &str, vout: u32, amount: i64) -> UnspentOutput {
    UnspentOutput {
        txid: txid.to_string(),
        vout,
        asset: String::new(),
        amount,
        spendable: true,
        solvable: true,
    }
}

#[derive(Default)]
pub struct MockLedger {
    balance: Balance,
    unspent: HashMap<String, Vec<UnspentOutput>>,
    labels: HashMap<String, String>,
    failing: HashSet<&'static str>,
    address_counter: AtomicUsize,
    pub signed: Mutex<Vec<String>>,
}

impl MockLedger {
    pub fn with_balance(mut self, entries: &[(&str, i64)]) -> Self {
        for (label, amount) in entries {
            self.balance.insert(label.to_string(), *amount);
        }
        self
    }

    pub fn with_unspent(mut self, asset: &str, utxos: Vec<UnspentOutput>) -> Self {
        let utxos = utxos
            .into_iter()
            .map(|u| UnspentOutput {
                asset: asset.to_string(),
                ..u
            })
            .collect();
        self.unspent.insert(asset.to_string(), utxos);
        self
    }

    pub fn with_labels(mut self, labels: &[(&str, &str)]) -> Self {
        for (label, id) in labels {
            self.labels.insert(label.to_string(), id.to_string());
        }
        self
    }

    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    fn check(&self, method: &'static str) -> Result<()> {
        if self.failing.contains(method) {
            return Err(NodeError::rpc(method, "mock failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerGateway for MockLedger {
    async fn get_wallet_info(&self) -> Result<WalletInfo> {
        self.check("getwalletinfo")?;
        Ok(WalletInfo {
            balance: self.balance.clone(),
        })
    }

    async fn list_unspent(
        &self,
        _min_conf: u32,
        _max_conf: u32,
        _addresses: &[String],
        asset: &str,
    ) -> Result<Vec<UnspentOutput>> {
        self.check("listunspent")?;
        Ok(self.unspent.get(asset).cloned().unwrap_or_default())
    }

    async fn get_new_address(&self, _confidential: bool) -> Result<String> {
        self.check("getnewaddress")?;
        let n = self.address_counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("change-addr-{}", n))
    }

    async fn sign_raw_transaction(&self, template: &str) -> Result<SignedTransaction> {
        self.check("signrawtransaction")?;
        self.signed.lock().push(template.to_string());
        Ok(SignedTransaction {
            hex: format!("signed:{}", template),
            complete: true,
        })
    }

    async fn dump_asset_labels(&self) -> Result<HashMap<String, String>> {
        self.check("dumpassetlabels")?;
        Ok(self.labels.clone())
    }
}

#[derive(Default)]
pub struct MockExchanger {
    offers: HashMap<String, ExchangeOfferResponse>,
    fail_submit: bool,
    pub offer_calls: Mutex<Vec<(String, i64, String)>>,
    pub submitted: Mutex<Vec<String>>,
}

impl MockExchanger {
    pub fn with_offer(mut self, offer_asset: &str, cost: i64, fee: i64, tx: &str) -> Self {
        self.offers.insert(
            offer_asset.to_string(),
            ExchangeOfferResponse {
                fee,
                cost,
                transaction: tx.to_string(),
            },
        );
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.fail_submit = true;
        self
    }
}

#[async_trait]
impl Exchanger for MockExchanger {
    async fn get_exchange_offer(
        &self,
        request_asset: &str,
        request_amount: i64,
        offer_asset: &str,
    ) -> Result<ExchangeOfferResponse> {
        self.offer_calls.lock().push((
            request_asset.to_string(),
            request_amount,
            offer_asset.to_string(),
        ));
        self.offers
            .get(offer_asset)
            .cloned()
            .ok_or_else(|| NodeError::Exchanger(format!("no offer for {}", offer_asset)))
    }

    async fn submit_exchange(&self, transaction: &str) -> Result<SubmitExchangeResponse> {
        if self.fail_submit {
            return Err(NodeError::Exchanger("submission rejected".into()));
        }
        self.submitted.lock().push(transaction.to_string());
        Ok(SubmitExchangeResponse {
            txid: "exchanged-txid".to_string(),
        })
    }
}

#[derive(Default)]
pub struct MockAssembler {
    fail: bool,
    pub requests: Mutex<Vec<TxBuildRequest>>,
}

impl MockAssembler {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TransactionAssembler for MockAssembler {
    async fn assemble(&self, request: &TxBuildRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        if self.fail {
            return Err(NodeError::TxBuilder("exit status: 1".into()));
        }
        Ok(format!("assembled:{}", request.template))
    }
}
