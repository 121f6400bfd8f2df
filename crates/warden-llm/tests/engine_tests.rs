//! Engine behavior against a scripted transport: cache-first reads, retry on
//! schema violations, safe defaults on exhaustion.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use warden_db::{StateStore, StoreConfig};
use warden_llm::{ChatTransport, DiagnosticEngine, HealthContext};
use warden_types::{
    FailureType, OnChainHealth, ProbeResult, TrendDirection, TrendReport, Verdict,
};

/// Transport that replays a scripted sequence of outcomes.
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<String>>>,
    calls: AtomicU32,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn complete(&self, _request: &Value) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("transport outage")))
    }
}

async fn open_store(dir: &TempDir) -> Arc<StateStore> {
    let path = dir.path().join("llm.db");
    Arc::new(
        StateStore::open(StoreConfig::new(path.to_string_lossy()))
            .await
            .expect("store should open"),
    )
}

fn probe(success: bool, ms: u64) -> ProbeResult {
    ProbeResult {
        success,
        response_time_ms: ms,
        body: success.then(|| r#"{"status":"ok"}"#.to_string()),
    }
}

fn health_context<'a>(
    agent_id: &'a str,
    probe: &'a ProbeResult,
    on_chain: &'a OnChainHealth,
    trends: &'a TrendReport,
) -> HealthContext<'a> {
    HealthContext {
        agent_id,
        endpoint: "https://agent.example/health",
        probe,
        on_chain,
        trends,
        validation: None,
        card: None,
        anomaly: false,
    }
}

fn healthy_decision_json() -> String {
    json!({
        "decision": "healthy",
        "reason": "endpoint responsive, latency nominal",
        "failureType": "none"
    })
    .to_string()
}

#[tokio::test(start_paused = true)]
async fn successful_decision_is_cached() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let transport = ScriptedTransport::new(vec![Ok(healthy_decision_json())]);
    let engine = DiagnosticEngine::new(transport.clone(), store.clone(), "test-model");

    let p = probe(true, 40);
    let chain = OnChainHealth::default();
    let trends = TrendReport::flat(TrendDirection::Stable);

    let first = engine
        .make_health_decision(&health_context("1", &p, &chain, &trends))
        .await;
    assert_eq!(first.decision, Verdict::Healthy);
    assert_eq!(transport.calls(), 1);

    // identical context hits the cache; the transport would fail if asked
    let second = engine
        .make_health_decision(&health_context("1", &p, &chain, &trends))
        .await;
    assert_eq!(second.decision, Verdict::Healthy);
    assert_eq!(transport.calls(), 1);

    // the key includes the response time: a different latency misses
    assert!(store.get_cached("health:1:true:40").await.unwrap().is_some());
    assert!(store.get_cached("health:1:true:41").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn schema_violation_retries_then_succeeds() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    // first reply drops the required `reason` field, second is valid
    let transport = ScriptedTransport::new(vec![
        Ok(json!({ "decision": "healthy" }).to_string()),
        Ok(healthy_decision_json()),
    ]);
    let engine = DiagnosticEngine::new(transport.clone(), store, "test-model");

    let p = probe(true, 55);
    let chain = OnChainHealth::default();
    let trends = TrendReport::flat(TrendDirection::Stable);

    let decision = engine
        .make_health_decision(&health_context("2", &p, &chain, &trends))
        .await;
    assert_eq!(decision.decision, Verdict::Healthy);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn outage_yields_probe_derived_default_and_no_cache_write() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let transport = ScriptedTransport::new(vec![
        Err(anyhow!("connect timeout")),
        Err(anyhow!("connect timeout")),
        Err(anyhow!("connect timeout")),
    ]);
    let engine = DiagnosticEngine::new(transport.clone(), store.clone(), "test-model");

    // successful probe: safe default must be healthy
    let p = probe(true, 80);
    let chain = OnChainHealth::default();
    let trends = TrendReport::flat(TrendDirection::Stable);
    let decision = engine
        .make_health_decision(&health_context("3", &p, &chain, &trends))
        .await;
    assert_eq!(decision.decision, Verdict::Healthy);
    assert_eq!(decision.failure_type(), FailureType::None);
    assert_eq!(transport.calls(), 3);

    // safe defaults are never cached
    assert!(store.get_cached("health:3:true:80").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_probe_default_is_suspicious() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let transport = ScriptedTransport::new(vec![]);
    let engine = DiagnosticEngine::new(transport, store, "test-model");

    let p = probe(false, 10_000);
    let chain = OnChainHealth::default();
    let trends = TrendReport::flat(TrendDirection::Degrading);
    let decision = engine
        .make_health_decision(&health_context("4", &p, &chain, &trends))
        .await;
    assert_eq!(decision.decision, Verdict::Suspicious);
    assert_eq!(decision.failure_type(), FailureType::Error);
}

#[tokio::test(start_paused = true)]
async fn validation_defaults_are_permissive() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let transport = ScriptedTransport::new(vec![]);
    let engine = DiagnosticEngine::new(transport, store, "test-model");

    let report = engine
        .validate_response("https://agent.example/health", r#"{"status":"ok"}"#, None)
        .await;
    assert!(report.is_valid);
    assert!(!report.is_spoofed);
    assert_eq!(report.confidence, 50.0);
}

#[tokio::test(start_paused = true)]
async fn narrative_is_cached_per_agent_and_degrades_gracefully() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let transport = ScriptedTransport::new(vec![Ok(json!({
        "summary": "reliable agent with strong uptime",
        "strengths": ["fast responses"],
        "concerns": [],
        "recommendation": "trust",
        "riskLevel": "low"
    })
    .to_string())]);
    let engine = DiagnosticEngine::new(transport.clone(), store.clone(), "test-model");

    let record = warden_types::AgentRecord::new("5", 1_700_000_000);
    let reputation = warden_types::ReputationSummary {
        mean: 4.2,
        count: 7,
    };

    let narrative = engine
        .generate_trust_narrative("5", &record, &reputation)
        .await;
    assert_eq!(narrative.summary, "reliable agent with strong uptime");
    assert!(store.get_cached("narrative:5").await.unwrap().is_some());

    // the script is exhausted; the cached narrative still answers
    let cached = engine
        .generate_trust_narrative("5", &record, &reputation)
        .await;
    assert_eq!(cached.summary, "reliable agent with strong uptime");
    assert_eq!(transport.calls(), 1);

    // a different agent misses the cache, exhausts the transport and
    // falls back to the deterministic unavailable narrative
    let fallback = engine
        .generate_trust_narrative("6", &record, &reputation)
        .await;
    assert_eq!(fallback.summary, "unavailable");
    assert_eq!(
        fallback.concerns,
        vec!["analysis unavailable".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn out_of_range_confidence_is_retried() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let transport = ScriptedTransport::new(vec![
        Ok(json!({
            "isValid": true,
            "schemaCompliant": true,
            "isSpoofed": false,
            "issues": [],
            "confidence": 900
        })
        .to_string()),
        Ok(json!({
            "isValid": false,
            "schemaCompliant": false,
            "isSpoofed": true,
            "issues": ["identity mismatch"],
            "confidence": 88
        })
        .to_string()),
    ]);
    let engine = DiagnosticEngine::new(transport.clone(), store, "test-model");

    let report = engine
        .validate_response("https://agent.example/health", "{}", None)
        .await;
    assert!(report.is_spoofed);
    assert_eq!(report.confidence, 88.0);
    assert_eq!(transport.calls(), 2);
}
