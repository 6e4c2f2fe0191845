use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct ExchangeOfferRequest {
    pub request: BTreeMap<String, i64>,
    pub offer: String,
}

impl ExchangeOfferRequest {
    pub fn new(request_asset: &str, request_amount: i64, offer_asset: &str) -> Self {
        let mut request = BTreeMap::new();
        request.insert(request_asset.to_string(), request_amount);
        Self {
            request,
            offer: offer_asset.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeOfferResponse {
    #[serde(deserialize_with = "string_amount")]
    pub fee: i64,
    #[serde(deserialize_with = "string_amount")]
    pub cost: i64,
    #[serde(rename = "tx")]
    pub transaction: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitExchangeRequest {
    #[serde(rename = "tx")]
    pub transaction: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitExchangeResponse {
    pub txid: String,
}

// the exchanger encodes integer amounts as JSON strings
fn string_amount<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.trim().parse().map_err(serde::de::Error::custom)
}
