//! Agent records and probe history.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Verdict;

/// One probe outcome as kept in the rolling history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSample {
    /// Unix seconds at probe time.
    pub ts: i64,
    pub response_time_ms: u64,
    pub success: bool,
}

/// Outcome of a single HTTP probe against an agent endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub success: bool,
    pub response_time_ms: u64,
    /// Response body when the probe succeeded, `None` otherwise.
    pub body: Option<String>,
}

impl ProbeResult {
    pub fn sample(&self, ts: i64) -> ProbeSample {
        ProbeSample {
            ts,
            response_time_ms: self.response_time_ms,
            success: self.success,
        }
    }
}

/// Durable per-agent row. Primary key is the decimal token id string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_address: Option<String>,
    pub endpoint_url: Option<String>,
    pub image_url: Option<String>,
    /// Cached metadata card, opaque to the store.
    pub card: Option<Value>,

    pub health_score: u8,
    pub consecutive_failures: u32,
    pub uptime_percent: f64,
    pub avg_response_ms: f64,
    pub total_checks: u64,
    pub successful_checks: u64,
    pub reputation_mean: f64,
    pub feedback_count: u64,

    pub monitored: bool,
    pub last_checked: Option<i64>,
    pub last_decision: Option<Verdict>,
    pub last_reason: Option<String>,

    pub response_history: Vec<ProbeSample>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl AgentRecord {
    /// Fresh row for an agent observed for the first time.
    pub fn new(agent_id: impl Into<String>, now: i64) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: None,
            description: None,
            owner_address: None,
            endpoint_url: None,
            image_url: None,
            card: None,
            health_score: 100,
            consecutive_failures: 0,
            uptime_percent: 0.0,
            avg_response_ms: 0.0,
            total_checks: 0,
            successful_checks: 0,
            reputation_mean: 0.0,
            feedback_count: 0,
            monitored: false,
            last_checked: None,
            last_decision: None,
            last_reason: None,
            response_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for `upsert_agent`. Only supplied fields are written;
/// everything else keeps its stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_address: Option<String>,
    pub endpoint_url: Option<String>,
    pub image_url: Option<String>,
    pub card: Option<Value>,
    pub health_score: Option<u8>,
    pub consecutive_failures: Option<u32>,
    pub uptime_percent: Option<f64>,
    pub avg_response_ms: Option<f64>,
    pub total_checks: Option<u64>,
    pub successful_checks: Option<u64>,
    pub reputation_mean: Option<f64>,
    pub feedback_count: Option<u64>,
    pub monitored: Option<bool>,
    pub last_checked: Option<i64>,
    pub last_decision: Option<Verdict>,
    pub last_reason: Option<String>,
}

impl AgentPatch {
    /// Merge this patch into `record`, leaving unsupplied fields untouched.
    pub fn apply(self, record: &mut AgentRecord) {
        if self.name.is_some() {
            record.name = self.name;
        }
        if self.description.is_some() {
            record.description = self.description;
        }
        if self.owner_address.is_some() {
            record.owner_address = self.owner_address;
        }
        if self.endpoint_url.is_some() {
            record.endpoint_url = self.endpoint_url;
        }
        if self.image_url.is_some() {
            record.image_url = self.image_url;
        }
        if self.card.is_some() {
            record.card = self.card;
        }
        if self.last_checked.is_some() {
            record.last_checked = self.last_checked;
        }
        if self.last_decision.is_some() {
            record.last_decision = self.last_decision;
        }
        if self.last_reason.is_some() {
            record.last_reason = self.last_reason;
        }
        if let Some(health_score) = self.health_score {
            record.health_score = health_score;
        }
        if let Some(consecutive_failures) = self.consecutive_failures {
            record.consecutive_failures = consecutive_failures;
        }
        if let Some(uptime_percent) = self.uptime_percent {
            record.uptime_percent = uptime_percent;
        }
        if let Some(avg_response_ms) = self.avg_response_ms {
            record.avg_response_ms = avg_response_ms;
        }
        if let Some(total_checks) = self.total_checks {
            record.total_checks = total_checks;
        }
        if let Some(successful_checks) = self.successful_checks {
            record.successful_checks = successful_checks;
        }
        if let Some(reputation_mean) = self.reputation_mean {
            record.reputation_mean = reputation_mean;
        }
        if let Some(feedback_count) = self.feedback_count {
            record.feedback_count = feedback_count;
        }
        if let Some(monitored) = self.monitored {
            record.monitored = monitored;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_merges_only_supplied_fields() {
        let mut record = AgentRecord::new("7", 1_700_000_000);
        record.name = Some("alpha".to_string());
        record.health_score = 90;

        let patch = AgentPatch {
            health_score: Some(75),
            last_reason: Some("degraded latency".to_string()),
            ..Default::default()
        };
        patch.apply(&mut record);

        assert_eq!(record.health_score, 75);
        assert_eq!(record.last_reason.as_deref(), Some("degraded latency"));
        // untouched fields survive
        assert_eq!(record.name.as_deref(), Some("alpha"));
        assert!(!record.monitored);
    }
}
