//! HTTP client for the counterparty that prices and settles exchanges.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::error::{NodeError, Result};
use crate::models::exchange::{
    ExchangeOfferRequest, ExchangeOfferResponse, SubmitExchangeRequest, SubmitExchangeResponse,
};

#[async_trait]
pub trait Exchanger: Send + Sync {
    async fn get_exchange_offer(
        &self,
        request_asset: &str,
        request_amount: i64,
        offer_asset: &str,
    ) -> Result<ExchangeOfferResponse>;

    async fn submit_exchange(&self, transaction: &str) -> Result<SubmitExchangeResponse>;
}

pub struct ExchangerClient {
    offer_url: String,
    submit_url: String,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl ExchangerClient {
    /// `base_url` is the exchanger root, e.g. `http://127.0.0.1:8020`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            offer_url: format!("{}/getexchangeoffer/", base),
            submit_url: format!("{}/submitexchange/", base),
            http_client: reqwest::Client::builder().timeout(timeout).build()?,
            timeout,
        })
    }

    async fn call<P: Serialize, R: DeserializeOwned>(&self, url: &str, param: &P) -> Result<R> {
        let response = self
            .http_client
            .post(url)
            .json(param)
            .send()
            .await
            .map_err(|e| self.http_error(url, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.http_error(url, e))?;
        if !status.is_success() {
            tracing::error!("Exchanger {} answered {}: {}", url, status, body);
            return Err(NodeError::Exchanger(format!("{} answered {}", url, status)));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Exchanger {} returned malformed JSON: {} ({:?})", url, e, body);
            NodeError::Exchanger(format!("malformed response from {}: {}", url, e))
        })
    }

    fn http_error(&self, url: &str, e: reqwest::Error) -> NodeError {
        tracing::error!("Exchanger {} request failed: {}", url, e);
        if e.is_timeout() {
            NodeError::timeout(format!("exchanger {}", url), self.timeout)
        } else {
            NodeError::Exchanger(e.to_string())
        }
    }
}

#[async_trait]
impl Exchanger for ExchangerClient {
    async fn get_exchange_offer(
        &self,
        request_asset: &str,
        request_amount: i64,
        offer_asset: &str,
    ) -> Result<ExchangeOfferResponse> {
        let request = ExchangeOfferRequest::new(request_asset, request_amount, offer_asset);
        self.call(&self.offer_url, &request).await
    }

    async fn submit_exchange(&self, transaction: &str) -> Result<SubmitExchangeResponse> {
        let request = SubmitExchangeRequest {
            transaction: transaction.to_string(),
        };
        self.call(&self.submit_url, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let client = ExchangerClient::new("http://127.0.0.1:8020/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.offer_url, "http://127.0.0.1:8020/getexchangeoffer/");
        assert_eq!(client.submit_url, "http://127.0.0.1:8020/submitexchange/");
    }

    #[tokio::test]
    async fn test_unreachable_exchanger_fails() {
        let client = ExchangerClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let res = client.get_exchange_offer("AAA", 100, "BBB").await;
        assert!(matches!(
            res,
            Err(NodeError::Exchanger(_)) | Err(NodeError::Timeout { .. })
        ));
    }
}
