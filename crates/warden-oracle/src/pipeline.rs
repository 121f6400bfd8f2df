//! The per-cycle pipeline orchestrator.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info, warn};
use warden_chain::{ChainApi, IndexerApi};
use warden_db::StateStore;
use warden_llm::{DiagnosticEngine, HealthContext, OnboardingRequest};
use warden_types::{
    AgentCard, AgentPatch, HealthEvent, OnChainHealth, OnboardingReview, ProbeResult,
};

use crate::{decision, discovery, metadata::CardResolver, probe::ProbeClient, reputation, trends};

/// Wires the pipeline together and runs one cycle at a time. Holds no
/// in-memory mutable state across cycles; everything durable lives in the
/// store, everything authoritative on the chain.
pub struct Orchestrator {
    chain: Arc<dyn ChainApi>,
    indexer: Arc<dyn IndexerApi>,
    engine: DiagnosticEngine,
    store: Arc<StateStore>,
    probe: ProbeClient,
    resolver: CardResolver,
}

impl Orchestrator {
    pub fn new(
        chain: Arc<dyn ChainApi>,
        indexer: Arc<dyn IndexerApi>,
        engine: DiagnosticEngine,
        store: Arc<StateStore>,
        metadata_gateway: &str,
    ) -> Self {
        Self {
            chain,
            indexer,
            engine,
            store,
            probe: ProbeClient::new(),
            resolver: CardResolver::new(metadata_gateway),
        }
    }

    /// One full monitoring cycle: discover, then check every agent
    /// sequentially. A failure for one agent never reaches the next.
    pub async fn run_cycle(&self) {
        let agents = discovery::list_monitored(self.indexer.as_ref(), self.chain.as_ref()).await;
        info!("[Cycle] Checking {} monitored agent(s)", agents.len());

        if let Err(e) = self.store.purge_expired_cache().await {
            warn!("[Cycle] Cache sweep failed: {e}");
        }

        for (agent_id, endpoint) in agents {
            let endpoint = (!endpoint.trim().is_empty()).then_some(endpoint);
            if let Err(e) = self.check_and_decide(&agent_id, endpoint.as_deref()).await {
                warn!("[Cycle] Agent {agent_id} skipped: {e:#}");
            }
        }

        info!("[Cycle] Done");
    }

    /// The per-agent state machine. Every remote failure is either isolated
    /// here or degraded into a component safe default; an `Err` return only
    /// skips this one agent for this one cycle.
    pub async fn check_and_decide(&self, agent_id: &str, endpoint: Option<&str>) -> Result<()> {
        let id: u64 = agent_id
            .parse()
            .with_context(|| format!("agent id is not numeric: {agent_id}"))?;

        // 1. authoritative monitored flag
        let on_chain = self
            .chain
            .get_health_data(id)
            .await
            .context("on-chain health read failed")?;
        if !on_chain.is_monitored {
            debug!("[Pipeline] Agent {agent_id} no longer monitored, skipping");
            return Ok(());
        }

        // 2. metadata card, then the endpoint to probe
        let card_doc = self.resolver.resolve_card(self.chain.as_ref(), id).await;
        let card: Option<AgentCard> = card_doc
            .as_ref()
            .and_then(|doc| serde_json::from_value(doc.clone()).ok());
        let Some(endpoint) = resolve_endpoint(endpoint, card.as_ref()) else {
            debug!("[Pipeline] Agent {agent_id} declares no health endpoint, skipping");
            return Ok(());
        };

        // identity refresh: the registry owner alongside the card fields
        let owner = match self.chain.owner_of(id).await {
            Ok(owner) => Some(owner),
            Err(e) => {
                debug!("[Pipeline] ownerOf({agent_id}) failed: {e}");
                None
            }
        };

        // 3. probe
        let probe = self.probe.probe(&endpoint).await;

        // 4. trends over the history as it stood before this probe
        let history = match self.store.get_agent(agent_id).await {
            Ok(record) => record.map(|r| r.response_history).unwrap_or_default(),
            Err(e) => {
                warn!("[Pipeline] History read failed for {agent_id}: {e}");
                Vec::new()
            }
        };
        let trend_report = trends::analyze(&history);
        let anomaly = probe.success && trends::is_anomalous(probe.response_time_ms, &trend_report);

        // 5. response validation, only when there is a body to judge
        let validation = match probe.body.as_deref() {
            Some(body) if probe.success => Some(
                self.engine
                    .validate_response(&endpoint, body, card_doc.as_ref())
                    .await,
            ),
            _ => None,
        };

        // 6. peer reputation
        let rep = reputation::fetch(self.indexer.as_ref(), self.chain.as_ref(), agent_id).await;

        // 7. the verdict
        let decision = self
            .engine
            .make_health_decision(&HealthContext {
                agent_id,
                endpoint: &endpoint,
                probe: &probe,
                on_chain: &on_chain,
                trends: &trend_report,
                validation: validation.as_ref(),
                card: card_doc.as_ref(),
                anomaly,
            })
            .await;
        info!(
            "[Pipeline] Agent {agent_id}: {} ({})",
            decision.decision, decision.reason
        );

        // 8. record the probe
        let now = chrono::Utc::now().timestamp();
        let record = match self
            .store
            .push_response_history(agent_id, probe.sample(now))
            .await
        {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("[Pipeline] History write failed for {agent_id}: {e}");
                None
            }
        };

        // 9. refresh the agent row with derived metrics
        let history_after = record
            .as_ref()
            .map(|r| r.response_history.as_slice())
            .unwrap_or_default();
        let patch = derive_patch(
            &on_chain,
            &probe,
            history_after,
            rep.mean,
            rep.count,
            now,
            &decision,
            card.as_ref(),
            card_doc,
            owner,
        );
        if let Err(e) = self.store.upsert_agent(agent_id, patch).await {
            warn!("[Pipeline] Agent upsert failed for {agent_id}: {e}");
        }

        // 10. append the health event
        let event = HealthEvent {
            agent_id: agent_id.to_string(),
            decision: decision.decision,
            reason: decision.reason.clone(),
            health_score: on_chain.health_score,
            response_time_ms: probe.response_time_ms,
            success: probe.success,
            failure_type: decision.failure_type,
            anomaly_detected: decision.anomaly_detected.or(Some(anomaly)),
            ts: 0,
        };
        if let Err(e) = self.store.log_health_event(event).await {
            warn!("[Pipeline] Event log failed for {agent_id}: {e}");
        }

        // 11. act on the verdict
        if let Err(e) =
            decision::apply_verdict(self.chain.as_ref(), &self.store, agent_id, &decision, &probe)
                .await
        {
            warn!("[Pipeline] Verdict action failed for {agent_id}: {e:#}");
        }

        Ok(())
    }

    /// Out-of-band signal: an agent enabled monitoring. Creates the row at
    /// first observation, seeded with whatever identity the registry and
    /// card already hold; the next cycle picks it up.
    pub async fn notify_registered(&self, agent_id: &str, endpoint: Option<String>) -> Result<()> {
        info!("[Pipeline] Registration signal for agent {agent_id}");
        let mut patch = AgentPatch {
            monitored: Some(true),
            endpoint_url: endpoint,
            ..Default::default()
        };

        // identity enrichment is best-effort: the row must exist even when
        // the chain or the gateways are down
        if let Ok(id) = agent_id.parse::<u64>() {
            match self.chain.owner_of(id).await {
                Ok(owner) => patch.owner_address = Some(owner),
                Err(e) => debug!("[Pipeline] ownerOf({agent_id}) failed: {e}"),
            }
            if let Some(doc) = self.resolver.resolve_card(self.chain.as_ref(), id).await {
                if let Ok(card) = serde_json::from_value::<AgentCard>(doc.clone()) {
                    apply_card_identity(&mut patch, &card);
                }
                patch.card = Some(doc);
            }
        }

        self.store
            .upsert_agent(agent_id, patch)
            .await
            .context("failed to create agent row")?;
        Ok(())
    }

    /// Out-of-band signal: an agent was unregistered. Cascades the delete
    /// across every collection; returns the collections touched.
    pub async fn notify_unregistered(&self, agent_id: &str) -> Result<Vec<&'static str>> {
        info!("[Pipeline] Unregistration signal for agent {agent_id}");
        self.store
            .delete_agent_data(agent_id)
            .await
            .context("failed to cascade agent delete")
    }

    /// Review a candidate registration: probe its declared endpoint for
    /// reachability, then let the diagnostic engine judge the submission.
    pub async fn review_onboarding(
        &self,
        name: &str,
        description: &str,
        endpoint: &str,
        capabilities: Vec<String>,
    ) -> OnboardingReview {
        let reachability = self.probe.probe(endpoint).await;
        self.engine
            .validate_onboarding(&OnboardingRequest {
                name: name.to_string(),
                description: description.to_string(),
                endpoint: endpoint.to_string(),
                capabilities,
                reachability: Some(reachability),
            })
            .await
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }
}

/// Prefer the endpoint discovery handed us; otherwise look in the card for
/// a service named status/health/ping.
fn resolve_endpoint(given: Option<&str>, card: Option<&AgentCard>) -> Option<String> {
    if let Some(endpoint) = given {
        if !endpoint.trim().is_empty() {
            return Some(endpoint.to_string());
        }
    }
    card?.health_endpoint().map(str::to_string)
}

/// Copy the card's identity fields into a patch, skipping blanks so a thin
/// card cannot blank out fields an earlier cycle filled in.
fn apply_card_identity(patch: &mut AgentPatch, card: &AgentCard) {
    if !card.name.trim().is_empty() {
        patch.name = Some(card.name.clone());
    }
    if !card.description.trim().is_empty() {
        patch.description = Some(card.description.clone());
    }
    if card.image.is_some() {
        patch.image_url = card.image.clone();
    }
}

#[allow(clippy::too_many_arguments)]
fn derive_patch(
    on_chain: &OnChainHealth,
    probe: &ProbeResult,
    history: &[warden_types::ProbeSample],
    reputation_mean: f64,
    feedback_count: u64,
    now: i64,
    decision: &warden_types::HealthDecision,
    card: Option<&AgentCard>,
    card_doc: Option<Value>,
    owner: Option<String>,
) -> AgentPatch {
    let total_checks = on_chain.total_checks + 1;
    let successful_checks = on_chain.successful_checks + u64::from(probe.success);
    let uptime_percent = if total_checks > 0 {
        successful_checks as f64 / total_checks as f64 * 100.0
    } else {
        0.0
    };

    // average over the successful probes still in the rolling window
    let successes: Vec<f64> = history
        .iter()
        .filter(|s| s.success)
        .map(|s| s.response_time_ms as f64)
        .collect();
    let avg_response_ms = if successes.is_empty() {
        0.0
    } else {
        successes.iter().sum::<f64>() / successes.len() as f64
    };

    let mut patch = AgentPatch {
        card: card_doc,
        owner_address: owner,
        health_score: Some(on_chain.health_score),
        consecutive_failures: Some(if probe.success {
            0
        } else {
            on_chain.consecutive_failures as u32 + 1
        }),
        uptime_percent: Some(uptime_percent),
        avg_response_ms: Some(avg_response_ms),
        total_checks: Some(total_checks),
        successful_checks: Some(successful_checks),
        reputation_mean: Some(reputation_mean),
        feedback_count: Some(feedback_count),
        monitored: Some(true),
        last_checked: Some(now),
        last_decision: Some(decision.decision),
        last_reason: Some(decision.reason.clone()),
        ..Default::default()
    };
    if let Some(card) = card {
        apply_card_identity(&mut patch, card);
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::{apply_card_identity, resolve_endpoint};
    use serde_json::json;
    use warden_types::{AgentCard, AgentPatch};

    fn card(value: serde_json::Value) -> AgentCard {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn explicit_endpoint_wins() {
        let card = card(json!({
            "services": [{ "name": "health", "endpoint": "https://card.example" }]
        }));
        assert_eq!(
            resolve_endpoint(Some("https://given.example"), Some(&card)),
            Some("https://given.example".to_string())
        );
    }

    #[test]
    fn card_service_is_the_fallback() {
        let card = card(json!({ "services": [
            { "name": "docs", "endpoint": "https://docs.example" },
            { "name": "ping", "endpoint": "https://ping.example" }
        ]}));
        assert_eq!(
            resolve_endpoint(None, Some(&card)),
            Some("https://ping.example".to_string())
        );
    }

    #[test]
    fn no_endpoint_anywhere_is_none() {
        assert_eq!(resolve_endpoint(None, None), None);
        let card = card(json!({
            "services": [{ "name": "docs", "endpoint": "https://d.example" }]
        }));
        assert_eq!(resolve_endpoint(Some("  "), Some(&card)), None);
    }

    #[test]
    fn card_identity_skips_blanks() {
        let mut patch = AgentPatch::default();
        let full = card(json!({
            "name": "translator",
            "description": "english-to-latin agent",
            "image": "ipfs://QmImage"
        }));
        apply_card_identity(&mut patch, &full);
        assert_eq!(patch.name.as_deref(), Some("translator"));
        assert_eq!(patch.description.as_deref(), Some("english-to-latin agent"));
        assert_eq!(patch.image_url.as_deref(), Some("ipfs://QmImage"));

        // a thin card must not blank out anything
        let mut patch = AgentPatch {
            name: Some("kept".to_string()),
            ..Default::default()
        };
        apply_card_identity(&mut patch, &card(json!({ "name": "  " })));
        assert_eq!(patch.name.as_deref(), Some("kept"));
        assert!(patch.description.is_none());
    }
}
