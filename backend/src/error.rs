use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NodeError>;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("no {0} found")]
    MissingParameter(&'static str),

    #[error("{0} must be a single record: {1}")]
    DuplicateParameter(&'static str, usize),

    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("offer not found: {0}")]
    OfferNotFound(String),

    #[error("invalid offer: {0}")]
    InvalidOffer(String),

    #[error("no sufficient utxo found for {asset}: need more than {required}, reserved {available}")]
    InsufficientFunds {
        asset: String,
        required: i64,
        available: i64,
    },

    #[error("unknown asset label: {0}")]
    UnknownAsset(String),

    #[error("RPC/{method} error: {message}")]
    Rpc { method: String, message: String },

    #[error("exchanger error: {0}")]
    Exchanger(String),

    #[error("transaction builder error: {0}")]
    TxBuilder(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl NodeError {
    /// Errors caused by a malformed caller request. No downstream call is made for these.
    pub fn is_request_format(&self) -> bool {
        matches!(
            self,
            NodeError::MissingParameter(_)
                | NodeError::DuplicateParameter(..)
                | NodeError::InvalidAmount(_)
        )
    }

    pub fn rpc(method: &str, message: impl std::fmt::Display) -> Self {
        NodeError::Rpc {
            method: method.to_string(),
            message: message.to_string(),
        }
    }

    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        NodeError::Timeout {
            operation: operation.into(),
            after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_format_classification() {
        assert!(NodeError::MissingParameter("asset").is_request_format());
        assert!(NodeError::DuplicateParameter("cost", 2).is_request_format());
        assert!(NodeError::InvalidAmount("abc".into()).is_request_format());

        assert!(!NodeError::OfferNotFound("x".into()).is_request_format());
        assert!(!NodeError::rpc("listunspent", "boom").is_request_format());
        assert!(!NodeError::Exchanger("down".into()).is_request_format());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = NodeError::rpc("signrawtransaction", "bad template");
        assert_eq!(err.to_string(), "RPC/signrawtransaction error: bad template");

        let err = NodeError::DuplicateParameter("addr", 3);
        assert_eq!(err.to_string(), "addr must be a single record: 3");
    }
}
