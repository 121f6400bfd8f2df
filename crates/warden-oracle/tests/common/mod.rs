//! Shared mocks for pipeline tests: a scripted chain, a switchable indexer,
//! a routing LLM transport and a bare-bones HTTP endpoint.

// not every test binary uses every helper
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use warden_chain::{ChainApi, IndexerApi};
use warden_db::{StateStore, StoreConfig};
use warden_llm::{ChatTransport, DiagnosticEngine};
use warden_oracle::Orchestrator;
use warden_types::{MonitoredAgent, OnChainHealth, ReputationSummary, TxOutcome};

/// Chain stub: canned health data per agent id, recorded writes.
#[derive(Default)]
pub struct MockChain {
    pub health: Mutex<HashMap<u64, OnChainHealth>>,
    pub token_uris: Mutex<HashMap<u64, String>>,
    pub update_health_calls: Mutex<Vec<(u64, u64, bool)>>,
    pub report_suspicious_calls: Mutex<Vec<(u64, String)>>,
    pub read_count: Mutex<u32>,
}

impl MockChain {
    pub fn with_monitored(ids: &[(u64, &str)]) -> Arc<Self> {
        let chain = Self::default();
        for (id, endpoint) in ids {
            chain.health.lock().unwrap().insert(
                *id,
                OnChainHealth {
                    health_score: 100,
                    is_monitored: true,
                    endpoint: endpoint.to_string(),
                    ..Default::default()
                },
            );
        }
        Arc::new(chain)
    }

    pub fn updates(&self) -> Vec<(u64, u64, bool)> {
        self.update_health_calls.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<(u64, String)> {
        self.report_suspicious_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainApi for MockChain {
    async fn get_health_data(&self, agent_id: u64) -> Result<OnChainHealth> {
        *self.read_count.lock().unwrap() += 1;
        self.health
            .lock()
            .unwrap()
            .get(&agent_id)
            .cloned()
            .ok_or_else(|| anyhow!("execution reverted: unknown token {agent_id}"))
    }

    async fn token_uri(&self, agent_id: u64) -> Result<String> {
        Ok(self
            .token_uris
            .lock()
            .unwrap()
            .get(&agent_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn owner_of(&self, _agent_id: u64) -> Result<String> {
        Ok("0x0000000000000000000000000000000000000001".to_string())
    }

    async fn reputation_summary(&self, _agent_id: u64) -> Result<ReputationSummary> {
        Ok(ReputationSummary {
            mean: 4.0,
            count: 2,
        })
    }

    async fn update_health(
        &self,
        agent_id: u64,
        response_time_ms: u64,
        success: bool,
    ) -> Result<TxOutcome> {
        self.update_health_calls
            .lock()
            .unwrap()
            .push((agent_id, response_time_ms, success));
        Ok(TxOutcome {
            hash: format!("0xupdate{agent_id}"),
            success: true,
        })
    }

    async fn report_suspicious(&self, agent_id: u64, reason: &str) -> Result<TxOutcome> {
        self.report_suspicious_calls
            .lock()
            .unwrap()
            .push((agent_id, reason.to_string()));
        Ok(TxOutcome {
            hash: format!("0xreport{agent_id}"),
            success: true,
        })
    }
}

/// Indexer stub: either a canned agent list or hard failure.
#[derive(Default)]
pub struct MockIndexer {
    pub agents: Option<Vec<MonitoredAgent>>,
    pub reputation: Option<ReputationSummary>,
}

impl MockIndexer {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_agents(agents: Vec<(&str, &str)>) -> Arc<Self> {
        Arc::new(Self {
            agents: Some(
                agents
                    .into_iter()
                    .map(|(id, endpoint)| MonitoredAgent {
                        agent_id: id.to_string(),
                        endpoint: endpoint.to_string(),
                        staked_amount: "1000000000000000000".to_string(),
                        last_check_timestamp: 0,
                    })
                    .collect(),
            ),
            reputation: Some(ReputationSummary {
                mean: 4.5,
                count: 3,
            }),
        })
    }
}

#[async_trait]
impl IndexerApi for MockIndexer {
    async fn monitored_agents(&self, _first: u32) -> Result<Vec<MonitoredAgent>> {
        self.agents
            .clone()
            .ok_or_else(|| anyhow!("indexer unreachable"))
    }

    async fn reputation_summary(&self, _agent_id: &str) -> Result<ReputationSummary> {
        self.reputation
            .ok_or_else(|| anyhow!("indexer unreachable"))
    }
}

/// Routes each request on its (stable, first-positioned) system prompt:
/// response validation gets a permissive verdict, health decisions pop a
/// scripted queue and fall back to the default.
pub struct RouterTransport {
    decisions: Mutex<VecDeque<String>>,
    default_decision: String,
}

impl RouterTransport {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self {
            decisions: Mutex::new(VecDeque::new()),
            default_decision: decision_json("healthy", "endpoint responsive", "none"),
        })
    }

    pub fn fixed(decision: &str, reason: &str, failure_type: &str) -> Arc<Self> {
        Arc::new(Self {
            decisions: Mutex::new(VecDeque::new()),
            default_decision: decision_json(decision, reason, failure_type),
        })
    }

}

pub fn decision_json(decision: &str, reason: &str, failure_type: &str) -> String {
    json!({
        "decision": decision,
        "reason": reason,
        "failureType": failure_type
    })
    .to_string()
}

#[async_trait]
impl ChatTransport for RouterTransport {
    async fn complete(&self, request: &Value) -> Result<String> {
        let system = request["messages"][0]["content"].as_str().unwrap_or_default();
        if system.contains("auditor") {
            return Ok(json!({
                "isValid": true,
                "schemaCompliant": true,
                "isSpoofed": false,
                "issues": [],
                "confidence": 90
            })
            .to_string());
        }
        if system.contains("reviewing") {
            return Ok(json!({
                "isValid": true,
                "issues": [],
                "suggestions": ["declare a status service in the card"],
                "duplicateRisk": "low",
                "readinessScore": 72
            })
            .to_string());
        }
        let mut queue = self.decisions.lock().unwrap();
        Ok(queue
            .pop_front()
            .unwrap_or_else(|| self.default_decision.clone()))
    }
}

pub async fn open_store(dir: &TempDir) -> Arc<StateStore> {
    let path = dir.path().join("oracle.db");
    Arc::new(
        StateStore::open(StoreConfig::new(path.to_string_lossy()))
            .await
            .expect("store should open"),
    )
}

pub fn build_orchestrator(
    chain: Arc<MockChain>,
    indexer: Arc<MockIndexer>,
    transport: Arc<dyn ChatTransport>,
    store: Arc<StateStore>,
) -> Orchestrator {
    let engine = DiagnosticEngine::new(transport, store.clone(), "test-model");
    Orchestrator::new(chain, indexer, engine, store, "https://ipfs.io")
}

/// Minimal HTTP endpoint answering every request with one canned response.
pub async fn spawn_endpoint(status: u16, body: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test endpoint");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}/health")
}
