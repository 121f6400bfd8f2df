//! Structured outputs of the diagnostic engine.
//!
//! Each type mirrors the JSON schema demanded from the model; a response
//! that fails to deserialize into one of these is a retryable failure.
//! The `safe_default` constructors are the deterministic fallbacks used
//! when the remote model exhausts its retries. Safe defaults are never
//! written to the response cache.

use serde::{Deserialize, Serialize};

use crate::{FailureType, Verdict};

/// Output of `validate_response`: is the probed body plausibly the declared
/// agent, or a spoof?
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub schema_compliant: bool,
    pub is_spoofed: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    /// 0..=100.
    pub confidence: f64,
}

impl ValidationReport {
    /// Permissive fallback when the model is unavailable.
    pub fn safe_default() -> Self {
        Self {
            is_valid: true,
            schema_compliant: true,
            is_spoofed: false,
            issues: Vec::new(),
            confidence: 50.0,
        }
    }

    pub fn in_range(&self) -> bool {
        (0.0..=100.0).contains(&self.confidence)
    }
}

/// Output of `make_health_decision`: the verdict that drives the on-chain
/// punishment state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDecision {
    pub decision: Verdict,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slash_percent: Option<f64>,
    #[serde(default)]
    pub failure_type: Option<FailureType>,
    #[serde(default)]
    pub anomaly_detected: Option<bool>,
    #[serde(default)]
    pub anomaly_details: Option<String>,
}

impl HealthDecision {
    pub fn failure_type(&self) -> FailureType {
        self.failure_type.unwrap_or_default()
    }

    /// Fallback derived purely from the probe outcome.
    pub fn safe_default(probe_success: bool, response_time_ms: u64) -> Self {
        let (decision, reason, failure_type) = if probe_success {
            (
                Verdict::Healthy,
                format!("endpoint responded in {response_time_ms}ms"),
                FailureType::None,
            )
        } else {
            (
                Verdict::Suspicious,
                "endpoint unreachable or returned an error status".to_string(),
                FailureType::Error,
            )
        };
        Self {
            decision,
            reason,
            slash_percent: None,
            failure_type: Some(failure_type),
            anomaly_detected: Some(false),
            anomaly_details: None,
        }
    }

    /// Reason string submitted on-chain: the failure type is appended in
    /// brackets unless it is `none`.
    pub fn chain_reason(&self) -> String {
        match self.failure_type() {
            FailureType::None => self.reason.clone(),
            other => format!("{} [{}]", self.reason, other),
        }
    }
}

/// Trust posture recommendation for report consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Trust,
    Verify,
    Caution,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Output of `generate_trust_narrative`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustNarrative {
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    pub recommendation: Recommendation,
    pub risk_level: RiskLevel,
}

impl TrustNarrative {
    pub fn safe_default() -> Self {
        Self {
            summary: "unavailable".to_string(),
            strengths: Vec::new(),
            concerns: vec!["analysis unavailable".to_string()],
            recommendation: Recommendation::Verify,
            risk_level: RiskLevel::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateRisk {
    None,
    Low,
    Medium,
    High,
}

/// Output of `validate_onboarding`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingReview {
    pub is_valid: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_description: Option<String>,
    pub duplicate_risk: DuplicateRisk,
    /// 0..=100.
    pub readiness_score: f64,
}

impl OnboardingReview {
    pub fn safe_default() -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
            suggestions: Vec::new(),
            generated_description: None,
            duplicate_risk: DuplicateRisk::None,
            readiness_score: 50.0,
        }
    }

    pub fn in_range(&self) -> bool {
        (0.0..=100.0).contains(&self.readiness_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_decision_safe_default_follows_probe() {
        let ok = HealthDecision::safe_default(true, 42);
        assert_eq!(ok.decision, Verdict::Healthy);
        assert_eq!(ok.failure_type(), FailureType::None);

        let bad = HealthDecision::safe_default(false, 10_000);
        assert_eq!(bad.decision, Verdict::Suspicious);
        assert_eq!(bad.failure_type(), FailureType::Error);
    }

    #[test]
    fn chain_reason_appends_failure_type() {
        let mut d = HealthDecision::safe_default(false, 0);
        d.reason = "timed out".to_string();
        d.failure_type = Some(FailureType::Timeout);
        assert_eq!(d.chain_reason(), "timed out [timeout]");

        d.failure_type = Some(FailureType::None);
        assert_eq!(d.chain_reason(), "timed out");
    }

    #[test]
    fn decision_parses_from_model_output() {
        let raw = r#"{
            "decision": "critical",
            "reason": "fabricated uptime",
            "slashPercent": 30,
            "failureType": "spoofed",
            "anomalyDetected": true
        }"#;
        let d: HealthDecision = serde_json::from_str(raw).unwrap();
        assert_eq!(d.decision, Verdict::Critical);
        assert_eq!(d.slash_percent, Some(30.0));
        assert_eq!(d.failure_type(), FailureType::Spoofed);
    }

    #[test]
    fn decision_tolerates_null_failure_type() {
        let raw = r#"{"decision":"healthy","reason":"ok","failureType":null}"#;
        let d: HealthDecision = serde_json::from_str(raw).unwrap();
        assert_eq!(d.failure_type(), FailureType::None);
    }
}
