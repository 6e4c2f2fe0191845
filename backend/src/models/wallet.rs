use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Asset label -> amount held by the wallet.
pub type Balance = BTreeMap<String, i64>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletInfo {
    #[serde(default, deserialize_with = "deserialize_balance")]
    pub balance: Balance,
}

#[derive(Debug, Serialize)]
pub struct WalletInfoResponse {
    pub balance: Balance,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnspentOutput {
    pub txid: String,
    pub vout: u32,
    #[serde(default)]
    pub asset: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: i64,
    #[serde(default)]
    pub spendable: bool,
    #[serde(default)]
    pub solvable: bool,
}

impl UnspentOutput {
    /// Outputs the wallet can neither spend nor solve are never selected.
    pub fn is_usable(&self) -> bool {
        self.spendable || self.solvable
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignedTransaction {
    pub hex: String,
    #[serde(default)]
    pub complete: bool,
}

/// The ledger reports amounts either as integers or as integral decimals
/// (`100.00000000`). Anything with a fractional part is rejected.
pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    amount_from_value(&value).map_err(serde::de::Error::custom)
}

fn deserialize_balance<'de, D>(deserializer: D) -> Result<Balance, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(label, value)| {
            amount_from_value(&value)
                .map(|amount| (label, amount))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

fn amount_from_value(value: &serde_json::Value) -> Result<i64, String> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(format!("amount {} is not an integer", n)),
            }
        }
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .map_err(|e| format!("amount {:?}: {}", s, e)),
        other => Err(format!("unexpected amount {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wallet_info_accepts_integral_decimals() {
        let info: WalletInfo = serde_json::from_value(json!({
            "walletversion": 60000,
            "balance": { "AAA": 1000, "BBB": 500.0, "bitcoin": "21" }
        }))
        .unwrap();

        assert_eq!(info.balance.get("AAA"), Some(&1000));
        assert_eq!(info.balance.get("BBB"), Some(&500));
        assert_eq!(info.balance.get("bitcoin"), Some(&21));
    }

    #[test]
    fn test_fractional_amount_is_rejected() {
        let res: Result<UnspentOutput, _> = serde_json::from_value(json!({
            "txid": "aa", "vout": 0, "amount": 0.5, "spendable": true
        }));
        assert!(res.is_err());
    }

    #[test]
    fn test_unspent_usability() {
        let utxo: UnspentOutput = serde_json::from_value(json!({
            "txid": "aa", "vout": 1, "asset": "BBB", "amount": 10, "solvable": true
        }))
        .unwrap();
        assert!(utxo.is_usable());
        assert!(!utxo.spendable);

        let dead = UnspentOutput { spendable: false, solvable: false, ..utxo };
        assert!(!dead.is_usable());
    }
}
