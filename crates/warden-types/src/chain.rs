//! Shapes read from the chain and the indexer.

use serde::{Deserialize, Serialize};

/// `HealthMonitor.getHealthData` view, decoded into native types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnChainHealth {
    pub health_score: u8,
    pub last_check_timestamp: u64,
    pub total_checks: u64,
    pub successful_checks: u64,
    pub failed_checks: u64,
    pub total_response_time: u64,
    pub consecutive_failures: u64,
    pub is_monitored: bool,
    /// Raw wei amount as a decimal string; the core never does math on it.
    pub staked_amount: String,
    pub endpoint: String,
}

/// One entry of the indexer's `monitoredAgents` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredAgent {
    pub agent_id: String,
    pub endpoint: String,
    #[serde(default)]
    pub staked_amount: String,
    #[serde(default)]
    pub last_check_timestamp: u64,
}

/// Aggregated peer feedback, in natural units (1e18 fixed point divided out).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReputationSummary {
    pub mean: f64,
    pub count: u64,
}

/// Outcome of a submitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutcome {
    pub hash: String,
    pub success: bool,
}
