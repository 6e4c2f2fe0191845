//! JSON-RPC access to the ledger node's wallet.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{NodeError, Result};
use crate::models::wallet::{SignedTransaction, UnspentOutput, WalletInfo};

pub const MIN_CONFIRMATIONS: u32 = 1;
pub const MAX_CONFIRMATIONS: u32 = 9_999_999;

#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn get_wallet_info(&self) -> Result<WalletInfo>;

    async fn list_unspent(
        &self,
        min_conf: u32,
        max_conf: u32,
        addresses: &[String],
        asset: &str,
    ) -> Result<Vec<UnspentOutput>>;

    async fn get_new_address(&self, confidential: bool) -> Result<String>;

    async fn sign_raw_transaction(&self, template: &str) -> Result<SignedTransaction>;

    /// Asset label -> asset id for every labelled asset the node knows.
    async fn dump_asset_labels(&self) -> Result<HashMap<String, String>>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct AddressInfo {
    #[serde(default)]
    unconfidential: Option<String>,
}

pub struct LedgerRpcClient {
    url: String,
    user: String,
    pass: String,
    http_client: reqwest::Client,
    timeout: Duration,
    next_id: AtomicU64,
}

impl LedgerRpcClient {
    pub fn new(url: &str, user: &str, pass: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            user: user.to_string(),
            pass: pass.to_string(),
            http_client,
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "1.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!("RPC/{} request: {}", method, body);

        let response = self
            .http_client
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.pass))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        // the node answers RPC-level errors with a non-2xx status and a JSON body
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        let parsed: RpcResponse<T> = serde_json::from_str(&text).map_err(|e| {
            tracing::error!("RPC/{} error: status {} body {:?}", method, status, text);
            NodeError::rpc(method, format!("status {}: {}", status, e))
        })?;

        if let Some(err) = parsed.error {
            tracing::error!("RPC/{} error: {} ({})", method, err.message, err.code);
            return Err(NodeError::rpc(method, format!("{} ({})", err.message, err.code)));
        }

        parsed
            .result
            .ok_or_else(|| NodeError::rpc(method, "empty result"))
    }

    fn transport_error(&self, method: &str, e: reqwest::Error) -> NodeError {
        tracing::error!("RPC/{} error: {}", method, e);
        if e.is_timeout() {
            NodeError::timeout(format!("RPC/{}", method), self.timeout)
        } else {
            NodeError::rpc(method, e)
        }
    }
}

#[async_trait]
impl LedgerGateway for LedgerRpcClient {
    async fn get_wallet_info(&self) -> Result<WalletInfo> {
        self.call("getwalletinfo", json!([])).await
    }

    async fn list_unspent(
        &self,
        min_conf: u32,
        max_conf: u32,
        addresses: &[String],
        asset: &str,
    ) -> Result<Vec<UnspentOutput>> {
        self.call("listunspent", json!([min_conf, max_conf, addresses, asset]))
            .await
    }

    async fn get_new_address(&self, confidential: bool) -> Result<String> {
        let address: String = self.call("getnewaddress", json!([])).await?;
        if confidential {
            return Ok(address);
        }

        let info: AddressInfo = self.call("validateaddress", json!([address])).await?;
        Ok(info.unconfidential.unwrap_or(address))
    }

    async fn sign_raw_transaction(&self, template: &str) -> Result<SignedTransaction> {
        self.call("signrawtransaction", json!([template])).await
    }

    async fn dump_asset_labels(&self) -> Result<HashMap<String, String>> {
        self.call("dumpassetlabels", json!([])).await
    }
}
