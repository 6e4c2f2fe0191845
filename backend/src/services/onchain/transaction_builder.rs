use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;

use crate::error::{NodeError, Result};
use crate::models::wallet::UnspentOutput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub amount: i64,
    pub address: String,
    pub asset_id: String,
}

/// Inputs and outputs to append to the exchanger's template.
#[derive(Debug, Clone)]
pub struct TxBuildRequest {
    pub template: String,
    pub inputs: Vec<UnspentOutput>,
    pub change: Option<TxOutput>,
    pub payment: TxOutput,
    pub fee: i64,
    pub fee_asset_id: String,
}

impl TxBuildRequest {
    /// Builder arguments: `[option] template in=... [outaddr=change] outaddr=payment outscript=fee`.
    pub fn to_args(&self, global_option: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(self.inputs.len() + 5);

        if !global_option.is_empty() {
            args.push(global_option.to_string());
        }
        args.push(self.template.clone());

        for utxo in &self.inputs {
            args.push(format!("in={}:{}:{}", utxo.txid, utxo.vout, utxo.amount));
        }

        if let Some(change) = &self.change {
            args.push(outaddr(change));
        }
        args.push(outaddr(&self.payment));
        // fee output carries no address
        args.push(format!("outscript={}::{}", self.fee, self.fee_asset_id));

        args
    }
}

fn outaddr(output: &TxOutput) -> String {
    format!(
        "outaddr={}:{}:{}",
        output.amount, output.address, output.asset_id
    )
}

#[async_trait]
pub trait TransactionAssembler: Send + Sync {
    /// Returns the composed, still unsigned, transaction template.
    async fn assemble(&self, request: &TxBuildRequest) -> Result<String>;
}

/// Runs the external `elements-tx` style command.
pub struct ElementsTxBuilder {
    command: String,
    option: String,
    timeout: Duration,
}

impl ElementsTxBuilder {
    pub fn new(command: &str, option: &str, timeout: Duration) -> Self {
        Self {
            command: command.to_string(),
            option: option.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl TransactionAssembler for ElementsTxBuilder {
    async fn assemble(&self, request: &TxBuildRequest) -> Result<String> {
        let args = request.to_args(&self.option);

        let mut command = tokio::process::Command::new(&self.command);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // dropping the output future on timeout kills the child
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::error!("{} error: {}\n\tparams: {:?}", self.command, e, args);
                return Err(NodeError::TxBuilder(format!(
                    "failed to run {}: {}",
                    self.command, e
                )));
            }
            Err(_) => {
                tracing::error!("{} timed out\n\tparams: {:?}", self.command, args);
                return Err(NodeError::timeout(self.command.clone(), self.timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                "{} error: {}\n\tparams: {:?}\n\toutput: {:?}",
                self.command,
                output.status,
                args,
                stderr
            );
            return Err(NodeError::TxBuilder(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let template = String::from_utf8_lossy(&output.stdout)
            .trim_end_matches(&['\r', '\n'][..])
            .to_string();
        if template.is_empty() {
            return Err(NodeError::TxBuilder(format!(
                "{} produced no transaction",
                self.command
            )));
        }

        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(change: Option<TxOutput>) -> TxBuildRequest {
        TxBuildRequest {
            template: "0200aa".to_string(),
            inputs: vec![
                UnspentOutput {
                    txid: "t1".into(),
                    vout: 0,
                    asset: "BBB".into(),
                    amount: 60,
                    spendable: true,
                    solvable: true,
                },
                UnspentOutput {
                    txid: "t2".into(),
                    vout: 3,
                    asset: "BBB".into(),
                    amount: 40,
                    spendable: true,
                    solvable: false,
                },
            ],
            change,
            payment: TxOutput {
                amount: 100,
                address: "dest".into(),
                asset_id: "aaa1".into(),
            },
            fee: 5,
            fee_asset_id: "bbb1".into(),
        }
    }

    #[test]
    fn test_args_with_change_and_option() {
        let change = TxOutput {
            amount: 15,
            address: "chg".into(),
            asset_id: "bbb1".into(),
        };
        let args = request(Some(change)).to_args("-regtest");

        assert_eq!(
            args,
            vec![
                "-regtest",
                "0200aa",
                "in=t1:0:60",
                "in=t2:3:40",
                "outaddr=15:chg:bbb1",
                "outaddr=100:dest:aaa1",
                "outscript=5::bbb1",
            ]
        );
    }

    #[test]
    fn test_args_without_change_or_option() {
        let args = request(None).to_args("");
        assert_eq!(args.first().map(String::as_str), Some("0200aa"));
        assert!(!args.iter().any(|a| a.starts_with("outaddr=") && a.contains(":chg:")));
        assert_eq!(args.len(), 5);
    }

    #[tokio::test]
    async fn test_stdout_becomes_template() {
        let builder = ElementsTxBuilder::new("echo", "", Duration::from_secs(5));
        let template = builder.assemble(&request(None)).await.unwrap();

        assert_eq!(
            template,
            "0200aa in=t1:0:60 in=t2:3:40 outaddr=100:dest:aaa1 outscript=5::bbb1"
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails() {
        let builder = ElementsTxBuilder::new("false", "", Duration::from_secs(5));
        let err = builder.assemble(&request(None)).await.unwrap_err();
        assert!(matches!(err, NodeError::TxBuilder(_)));
    }

    #[tokio::test]
    async fn test_missing_command_fails() {
        let builder =
            ElementsTxBuilder::new("/nonexistent/elements-tx", "", Duration::from_secs(5));
        let err = builder.assemble(&request(None)).await.unwrap_err();
        assert!(matches!(err, NodeError::TxBuilder(_)));
    }

    #[tokio::test]
    async fn test_hung_builder_times_out() {
        let mut req = request(None);
        req.template = "sleep 5".to_string();
        // sh -c "sleep 5" in=... outaddr=...
        let builder = ElementsTxBuilder::new("sh", "-c", Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = builder.assemble(&req).await.unwrap_err();

        assert!(matches!(err, NodeError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
