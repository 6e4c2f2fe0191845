pub mod transaction_builder;
pub mod utxo_selector;

pub use transaction_builder::{ElementsTxBuilder, TransactionAssembler, TxBuildRequest, TxOutput};
pub use utxo_selector::UtxoSelector;
