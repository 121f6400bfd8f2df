//! The diagnostic engine.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};
use warden_db::StateStore;
use warden_types::{
    AgentRecord, HealthDecision, OnChainHealth, OnboardingReview, ProbeResult, ReputationSummary,
    TrendReport, TrustNarrative, ValidationReport,
};

use crate::{prompts::LlmOp, transport::ChatTransport};

/// Attempts per operation; back-off is linear (2 s, 4 s).
const LLM_ATTEMPTS: u32 = 3;
const LLM_BACKOFF: Duration = Duration::from_secs(2);

/// Everything `make_health_decision` sees for one agent in one cycle.
pub struct HealthContext<'a> {
    pub agent_id: &'a str,
    pub endpoint: &'a str,
    pub probe: &'a ProbeResult,
    pub on_chain: &'a OnChainHealth,
    pub trends: &'a TrendReport,
    pub validation: Option<&'a ValidationReport>,
    pub card: Option<&'a Value>,
    pub anomaly: bool,
}

/// Candidate registration reviewed by `validate_onboarding`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    pub name: String,
    pub description: String,
    pub endpoint: String,
    pub capabilities: Vec<String>,
    /// Outcome of a reachability probe against the declared endpoint.
    pub reachability: Option<ProbeResult>,
}

pub struct DiagnosticEngine {
    transport: Arc<dyn ChatTransport>,
    store: Arc<StateStore>,
    model: String,
}

impl DiagnosticEngine {
    pub fn new(transport: Arc<dyn ChatTransport>, store: Arc<StateStore>, model: &str) -> Self {
        Self {
            transport,
            store,
            model: model.to_string(),
        }
    }

    /// Judge whether a probed body plausibly belongs to the declared agent.
    pub async fn validate_response(
        &self,
        endpoint: &str,
        body: &str,
        card: Option<&Value>,
    ) -> ValidationReport {
        let key = format!("response:{endpoint}:{:x}", md5::compute(body));
        let context = json!({
            "endpoint": endpoint,
            "responseBody": body,
            "metadataCard": card,
        });
        self.complete(LlmOp::ValidateResponse, &key, context, ValidationReport::in_range)
            .await
            .unwrap_or_else(ValidationReport::safe_default)
    }

    /// The verdict that drives the punishment state machine. Falls back to a
    /// probe-derived default when the model is unavailable.
    pub async fn make_health_decision(&self, ctx: &HealthContext<'_>) -> HealthDecision {
        // response time is part of the key on purpose: two probes with
        // different latency are different questions
        let key = format!(
            "health:{}:{}:{}",
            ctx.agent_id, ctx.probe.success, ctx.probe.response_time_ms
        );
        let context = json!({
            "agentId": ctx.agent_id,
            "endpoint": ctx.endpoint,
            "probe": ctx.probe,
            "onChainHealth": ctx.on_chain,
            "trends": ctx.trends,
            "validation": ctx.validation,
            "metadataCard": ctx.card,
            "anomalySuspected": ctx.anomaly,
        });
        self.complete(LlmOp::HealthDecision, &key, context, |_: &HealthDecision| true)
            .await
            .unwrap_or_else(|| {
                HealthDecision::safe_default(ctx.probe.success, ctx.probe.response_time_ms)
            })
    }

    /// Consumer-facing trust report for one agent.
    pub async fn generate_trust_narrative(
        &self,
        agent_id: &str,
        record: &AgentRecord,
        reputation: &ReputationSummary,
    ) -> TrustNarrative {
        let key = format!("narrative:{agent_id}");
        let context = json!({
            "agentId": agent_id,
            "name": record.name,
            "healthScore": record.health_score,
            "uptimePercent": record.uptime_percent,
            "avgResponseMs": record.avg_response_ms,
            "totalChecks": record.total_checks,
            "successfulChecks": record.successful_checks,
            "lastDecision": record.last_decision,
            "lastReason": record.last_reason,
            "reputation": reputation,
        });
        self.complete(LlmOp::TrustNarrative, &key, context, |_: &TrustNarrative| true)
            .await
            .unwrap_or_else(TrustNarrative::safe_default)
    }

    /// Review a candidate registration before it is accepted for monitoring.
    pub async fn validate_onboarding(&self, request: &OnboardingRequest) -> OnboardingReview {
        let key = format!("onboard:{}:{}", request.name, request.endpoint);
        let context = json!(request);
        self.complete(LlmOp::OnboardingReview, &key, context, OnboardingReview::in_range)
            .await
            .unwrap_or_else(OnboardingReview::safe_default)
    }

    /// One schema-constrained completion: cache lookup, then up to three
    /// attempts, then `None` (the caller substitutes its safe default —
    /// defaults are never cached).
    async fn complete<T, F>(
        &self,
        op: LlmOp,
        cache_key: &str,
        user_context: Value,
        check: F,
    ) -> Option<T>
    where
        T: DeserializeOwned + Serialize,
        F: Fn(&T) -> bool,
    {
        match self.store.get_cached(cache_key).await {
            Ok(Some(value)) => {
                if let Ok(parsed) = serde_json::from_value::<T>(value) {
                    if check(&parsed) {
                        debug!("[LLM] Cache hit: {cache_key}");
                        return Some(parsed);
                    }
                }
                warn!("[LLM] Discarding corrupt cache entry: {cache_key}");
            }
            Ok(None) => {}
            Err(e) => warn!("[LLM] Cache read failed for {cache_key}: {e}"),
        }

        let request = self.request_body(op, &user_context);

        for attempt in 1..=LLM_ATTEMPTS {
            match self.transport.complete(&request).await {
                Ok(content) => match serde_json::from_str::<T>(&content) {
                    Ok(parsed) if check(&parsed) => {
                        if let Ok(value) = serde_json::to_value(&parsed) {
                            if let Err(e) = self.store.set_cached(cache_key, &value).await {
                                warn!("[LLM] Cache write failed for {cache_key}: {e}");
                            }
                        }
                        return Some(parsed);
                    }
                    Ok(_) => {
                        warn!(
                            "[LLM] {} attempt {attempt}/{LLM_ATTEMPTS}: output out of range",
                            op.name()
                        );
                    }
                    Err(e) => {
                        warn!(
                            "[LLM] {} attempt {attempt}/{LLM_ATTEMPTS}: schema violation: {e}",
                            op.name()
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        "[LLM] {} attempt {attempt}/{LLM_ATTEMPTS}: transport failure: {e}",
                        op.name()
                    );
                }
            }
            if attempt < LLM_ATTEMPTS {
                tokio::time::sleep(LLM_BACKOFF * attempt).await;
            }
        }

        warn!("[LLM] {} exhausted retries, using safe default", op.name());
        None
    }

    /// System prompt first, dynamic context last; the stable prefix ordering
    /// is load-bearing for provider-side prompt caching.
    fn request_body(&self, op: LlmOp, user_context: &Value) -> Value {
        json!({
            "model": self.model,
            "temperature": 0.1,
            "max_tokens": op.max_tokens(),
            "messages": [
                { "role": "system", "content": op.system_prompt() },
                { "role": "user", "content": user_context.to_string() }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": op.schema()
            }
        })
    }
}
