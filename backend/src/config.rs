//! Node settings, read from the environment (a `.env` file is honoured).

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const ACTOR_NAME: &str = "alice";
pub const EXCHANGER_NAME: &str = "charlie";

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:10000";
const DEFAULT_RPC_USER: &str = "user";
const DEFAULT_RPC_PASS: &str = "pass";
const DEFAULT_LISTEN: &str = ":8000";
const DEFAULT_TX_PATH: &str = "elements-tx";
const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 600;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_EXCHANGER_LISTEN: &str = ":8020";

#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: String,
    pub rpc_user: String,
    pub rpc_pass: String,
    pub listen_addr: String,
    pub tx_path: String,
    pub tx_option: String,
    pub lock_timeout: Duration,
    pub sweep_interval: Duration,
    pub rpc_timeout: Duration,
    pub exchanger_timeout: Duration,
    pub tx_builder_timeout: Duration,
    pub html_dir: PathBuf,
    pub confidential: bool,
    pub exchanger_addr: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = ACTOR_NAME.to_uppercase();
        let own = |key: &str| lookup(&format!("{}_{}", prefix, key));
        let string = |key: &str, default: &str| own(key).unwrap_or_else(|| default.to_string());
        let seconds = |key: &str, default: u64| -> Result<Duration> {
            match own(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| {
                        format!("{}_{} must be a number of seconds, got {:?}", prefix, key, raw)
                    }),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let confidential = match own("CONFIDENTIAL") {
            Some(raw) => raw
                .trim()
                .parse::<bool>()
                .with_context(|| format!("{}_CONFIDENTIAL must be true or false", prefix))?,
            None => false,
        };

        let sweep_interval = seconds("SWEEP_INTERVAL", DEFAULT_SWEEP_INTERVAL_SECS)?;
        if sweep_interval.is_zero() {
            anyhow::bail!("{}_SWEEP_INTERVAL must be at least one second", prefix);
        }

        let exchanger_addr = lookup(&format!("{}_LADDR", EXCHANGER_NAME.to_uppercase()))
            .unwrap_or_else(|| DEFAULT_EXCHANGER_LISTEN.to_string());

        Ok(Self {
            rpc_url: string("RPCURL", DEFAULT_RPC_URL),
            rpc_user: string("RPCUSER", DEFAULT_RPC_USER),
            rpc_pass: string("RPCPASS", DEFAULT_RPC_PASS),
            listen_addr: string("LADDR", DEFAULT_LISTEN),
            tx_path: string("TXPATH", DEFAULT_TX_PATH),
            tx_option: string("TXOPTION", ""),
            lock_timeout: seconds("TIMEOUT", DEFAULT_LOCK_TIMEOUT_SECS)?,
            sweep_interval,
            rpc_timeout: seconds("RPC_TIMEOUT", DEFAULT_CALL_TIMEOUT_SECS)?,
            exchanger_timeout: seconds("EXCHANGER_TIMEOUT", DEFAULT_CALL_TIMEOUT_SECS)?,
            tx_builder_timeout: seconds("TXBUILDER_TIMEOUT", DEFAULT_CALL_TIMEOUT_SECS)?,
            html_dir: PathBuf::from(string("HTML_DIR", &format!("./html/{}", ACTOR_NAME))),
            confidential,
            exchanger_addr,
        })
    }

    /// Socket address the local listener binds to.
    pub fn bind_addr(&self) -> String {
        normalize_addr(&self.listen_addr, "0.0.0.0")
    }

    pub fn exchanger_base_url(&self) -> String {
        format!("http://{}", normalize_addr(&self.exchanger_addr, "127.0.0.1"))
    }
}

/// Accepts `:port`, `port` or `host:port`.
fn normalize_addr(addr: &str, default_host: &str) -> String {
    let addr = addr.trim();
    if let Some(port) = addr.strip_prefix(':') {
        format!("{}:{}", default_host, port)
    } else if addr.chars().all(|c| c.is_ascii_digit()) {
        format!("{}:{}", default_host, addr)
    } else {
        addr.to_string()
    }
}
