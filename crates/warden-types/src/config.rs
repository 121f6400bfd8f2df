//! Process configuration loaded from the environment.
//!
//! Mandatory variables missing at startup are fatal; the process refuses
//! to start rather than run with a partial configuration.

use std::time::Duration;

use anyhow::{Context, Result};

/// Everything the oracle process needs, resolved once at startup and
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub rpc_url: String,
    pub private_key: String,
    pub indexer_url: String,
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub state_store_uri: String,

    pub identity_registry: String,
    pub health_monitor: String,
    pub reputation_registry: String,
    pub oracle_token: Option<String>,

    pub metadata_gateway: String,
    pub cycle_interval: Duration,
    pub cache_ttl: Duration,
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("missing mandatory environment variable {name}"))
}

fn optional_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn seconds_or(name: &str, default: u64) -> Result<Duration> {
    match std::env::var(name) {
        Ok(raw) => {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("{name} must be an integer number of seconds"))?;
            Ok(Duration::from_secs(secs))
        }
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

impl OracleConfig {
    /// Load from the process environment (after `dotenvy::dotenv()`).
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            rpc_url: required("RPC_URL")?,
            private_key: required("PRIVATE_KEY")?,
            indexer_url: required("INDEXER_URL")?,
            llm_api_key: required("LLM_API_KEY")?,
            llm_api_url: optional_or("LLM_API_URL", "https://api.openai.com/v1/chat/completions"),
            llm_model: optional_or("LLM_MODEL", "gpt-4o-mini"),
            state_store_uri: required("STATE_STORE_URI")?,
            identity_registry: required("IDENTITY_REGISTRY")?,
            health_monitor: required("HEALTH_MONITOR")?,
            reputation_registry: required("REPUTATION_REGISTRY")?,
            oracle_token: std::env::var("ORACLE_TOKEN").ok(),
            metadata_gateway: optional_or("METADATA_GATEWAY", "https://ipfs.io"),
            cycle_interval: seconds_or("CYCLE_INTERVAL_SEC", 600)?,
            cache_ttl: seconds_or("CACHE_TTL_SEC", 300)?,
        })
    }
}
