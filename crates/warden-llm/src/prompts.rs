//! The fixed per-operation prompt and output-schema table.
//!
//! System prompts are stable and always placed first in the message list,
//! with the dynamic context last. That ordering is a contract: it lets the
//! upstream provider cache the stable prefix.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

/// The four diagnostic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmOp {
    ValidateResponse,
    HealthDecision,
    TrustNarrative,
    OnboardingReview,
}

impl LlmOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ValidateResponse => "validate_response",
            Self::HealthDecision => "health_decision",
            Self::TrustNarrative => "trust_narrative",
            Self::OnboardingReview => "onboarding_review",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::ValidateResponse => VALIDATE_RESPONSE_PROMPT,
            Self::HealthDecision => HEALTH_DECISION_PROMPT,
            Self::TrustNarrative => TRUST_NARRATIVE_PROMPT,
            Self::OnboardingReview => ONBOARDING_REVIEW_PROMPT,
        }
    }

    pub fn schema(&self) -> &'static Value {
        match self {
            Self::ValidateResponse => &VALIDATE_RESPONSE_SCHEMA,
            Self::HealthDecision => &HEALTH_DECISION_SCHEMA,
            Self::TrustNarrative => &TRUST_NARRATIVE_SCHEMA,
            Self::OnboardingReview => &ONBOARDING_REVIEW_SCHEMA,
        }
    }

    pub fn max_tokens(&self) -> u32 {
        match self {
            Self::ValidateResponse | Self::HealthDecision => 500,
            Self::TrustNarrative | Self::OnboardingReview => 800,
        }
    }
}

const VALIDATE_RESPONSE_PROMPT: &str = "You are a service-response auditor for a network of \
registered agents. Given an agent's declared metadata and the body its health endpoint \
returned, judge whether the response plausibly comes from the declared service, whether it \
follows a sane status shape, and whether it shows signs of spoofing (copied identity, \
fabricated metrics, mismatched capabilities). List concrete issues. Respond with JSON only.";

const HEALTH_DECISION_PROMPT: &str = "You are the health adjudicator for a network of \
registered agents. You receive one agent's probe outcome, its on-chain health record, \
rolling latency trends and an optional response validation. Decide healthy, suspicious or \
critical. Reserve critical for clear evidence of fraud or fabricated data. Give a short \
operator-readable reason and classify the failure. Respond with JSON only.";

const TRUST_NARRATIVE_PROMPT: &str = "You are writing a trust report for a consumer choosing \
between registered agents. From the agent's health record, peer reputation and recent \
verdict, write a concise summary, list strengths and concerns, and recommend a trust \
posture. Respond with JSON only.";

const ONBOARDING_REVIEW_PROMPT: &str = "You are reviewing a new agent registration for a \
monitored network. Judge whether the declared name, description, endpoint and capabilities \
describe a real, reachable, non-duplicate service. Suggest improvements and optionally a \
cleaner description. Respond with JSON only.";

static VALIDATE_RESPONSE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "name": "response_validation",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": {
                "isValid": { "type": "boolean" },
                "schemaCompliant": { "type": "boolean" },
                "isSpoofed": { "type": "boolean" },
                "issues": { "type": "array", "items": { "type": "string" } },
                "confidence": { "type": "number", "minimum": 0, "maximum": 100 }
            },
            "required": ["isValid", "schemaCompliant", "isSpoofed", "issues", "confidence"],
            "additionalProperties": false
        }
    })
});

static HEALTH_DECISION_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "name": "health_decision",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": {
                "decision": { "type": "string", "enum": ["healthy", "suspicious", "critical"] },
                "reason": { "type": "string" },
                "slashPercent": { "type": ["number", "null"] },
                "failureType": {
                    "type": ["string", "null"],
                    "enum": ["none", "timeout", "error", "spoofed", "degraded", "unknown", null]
                },
                "anomalyDetected": { "type": ["boolean", "null"] },
                "anomalyDetails": { "type": ["string", "null"] }
            },
            "required": ["decision", "reason"],
            "additionalProperties": false
        }
    })
});

static TRUST_NARRATIVE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "name": "trust_narrative",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": {
                "summary": { "type": "string" },
                "strengths": { "type": "array", "items": { "type": "string" } },
                "concerns": { "type": "array", "items": { "type": "string" } },
                "recommendation": { "type": "string", "enum": ["trust", "verify", "caution", "avoid"] },
                "riskLevel": { "type": "string", "enum": ["low", "medium", "high", "critical"] }
            },
            "required": ["summary", "strengths", "concerns", "recommendation", "riskLevel"],
            "additionalProperties": false
        }
    })
});

static ONBOARDING_REVIEW_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "name": "onboarding_review",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": {
                "isValid": { "type": "boolean" },
                "issues": { "type": "array", "items": { "type": "string" } },
                "suggestions": { "type": "array", "items": { "type": "string" } },
                "generatedDescription": { "type": ["string", "null"] },
                "duplicateRisk": { "type": "string", "enum": ["none", "low", "medium", "high"] },
                "readinessScore": { "type": "number", "minimum": 0, "maximum": 100 }
            },
            "required": ["isValid", "issues", "suggestions", "duplicateRisk", "readinessScore"],
            "additionalProperties": false
        }
    })
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_op_has_prompt_and_schema() {
        for op in [
            LlmOp::ValidateResponse,
            LlmOp::HealthDecision,
            LlmOp::TrustNarrative,
            LlmOp::OnboardingReview,
        ] {
            assert!(!op.system_prompt().is_empty());
            assert!(op.schema().get("schema").is_some());
            assert!(op.max_tokens() > 0);
        }
    }
}
