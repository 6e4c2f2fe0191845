use std::collections::HashMap;

use crate::models::wallet::Balance;

/// The node's policy asset is never offered or requested.
const EXCLUDED_LABEL: &str = "bitcoin";

/// Allow-list of recognized asset labels, mapped to their ledger asset ids.
/// Filled once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    ids: HashMap<String, String>,
}

impl AssetRegistry {
    pub fn from_labels(mut labels: HashMap<String, String>) -> Self {
        labels.remove(EXCLUDED_LABEL);
        Self { ids: labels }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.ids.contains_key(label)
    }

    pub fn asset_id(&self, label: &str) -> Option<&str> {
        self.ids.get(label).map(String::as_str)
    }

    /// Drops every balance entry whose label is not recognized.
    pub fn retain_known(&self, balance: &mut Balance) {
        balance.retain(|label, _| self.contains(label));
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AssetRegistry {
        AssetRegistry::from_labels(HashMap::from([
            ("bitcoin".to_string(), "b1".to_string()),
            ("AAA".to_string(), "a1".to_string()),
            ("BBB".to_string(), "b2".to_string()),
        ]))
    }

    #[test]
    fn test_bitcoin_label_is_excluded() {
        let assets = registry();
        assert_eq!(assets.len(), 2);
        assert!(!assets.contains("bitcoin"));
        assert_eq!(assets.asset_id("AAA"), Some("a1"));
    }

    #[test]
    fn test_unrecognized_balances_are_removed() {
        let assets = registry();
        let mut balance = Balance::new();
        balance.insert("AAA".into(), 1000);
        balance.insert("BBB".into(), 500);
        balance.insert("bitcoin".into(), 21);
        balance.insert("deadbeef".into(), 7);

        assets.retain_known(&mut balance);

        assert_eq!(balance.len(), 2);
        assert_eq!(balance.get("AAA"), Some(&1000));
        assert!(!balance.contains_key("deadbeef"));
        assert!(!balance.contains_key("bitcoin"));
    }
}
