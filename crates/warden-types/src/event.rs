use serde::{Deserialize, Serialize};

use crate::{FailureType, Verdict};

/// One row of the append-only health event log. Events are immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthEvent {
    pub agent_id: String,
    pub decision: Verdict,
    pub reason: String,
    /// Health score at the time of the event.
    pub health_score: u8,
    pub response_time_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_type: Option<FailureType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_detected: Option<bool>,
    /// Unix seconds, stamped by the store on insert.
    #[serde(default)]
    pub ts: i64,
}

/// Per-agent debounce counter driving the slash threshold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuspiciousCounter {
    pub consecutive: u32,
    pub last_at: i64,
    pub total_seen: u64,
    pub last_slashed_at: Option<i64>,
}
