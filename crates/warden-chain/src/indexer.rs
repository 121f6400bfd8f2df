//! GraphQL indexer client.
//!
//! Every response is shape-checked before use; a malformed payload is an
//! error so callers take their chain fallback.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;
use warden_types::{MonitoredAgent, ReputationSummary};

use crate::IndexerApi;

const MONITORED_AGENTS_QUERY: &str = r#"
query MonitoredAgents($first: Int!) {
  monitoredAgents(first: $first, where: { isActive: true }) {
    agentId
    endpoint
    stakedAmount
    lastCheckTimestamp
  }
}"#;

const REPUTATION_SUMMARY_QUERY: &str = r#"
query ReputationSummary($id: ID!) {
  reputationSummary(id: $id) {
    count
    sum
    mean
  }
}"#;

pub struct IndexerClient {
    client: Client,
    url: String,
}

impl IndexerClient {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("warden-oracle/0.1")
            .build()
            .context("failed to build indexer HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    async fn query(&self, query: &str, variables: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .context("indexer request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("indexer returned HTTP {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .context("indexer returned a non-JSON body")?;

        if let Some(errors) = body.get("errors") {
            return Err(anyhow!("indexer returned errors: {errors}"));
        }

        body.get("data")
            .cloned()
            .ok_or_else(|| anyhow!("indexer response missing data field"))
    }
}

#[async_trait]
impl IndexerApi for IndexerClient {
    async fn monitored_agents(&self, first: u32) -> Result<Vec<MonitoredAgent>> {
        let data = self
            .query(MONITORED_AGENTS_QUERY, json!({ "first": first }))
            .await?;

        let entries = data
            .get("monitoredAgents")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("monitoredAgents is missing or not a list"))?;

        let mut agents = Vec::with_capacity(entries.len());
        for entry in entries {
            let agent: MonitoredAgent = serde_json::from_value(entry.clone())
                .context("malformed monitoredAgents entry")?;
            agents.push(agent);
        }

        debug!("[Indexer] {} monitored agents", agents.len());
        Ok(agents)
    }

    async fn reputation_summary(&self, agent_id: &str) -> Result<ReputationSummary> {
        let data = self
            .query(REPUTATION_SUMMARY_QUERY, json!({ "id": agent_id }))
            .await?;

        let Some(summary) = data.get("reputationSummary").filter(|v| !v.is_null()) else {
            // no feedback recorded yet
            return Ok(ReputationSummary::default());
        };

        let count = summary
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| anyhow!("reputationSummary.count is missing"))?;

        // mean arrives as a 1e18 fixed-point decimal string
        let mean_raw = summary
            .get("mean")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("reputationSummary.mean is missing"))?;
        let mean = mean_raw
            .parse::<f64>()
            .context("reputationSummary.mean is not numeric")?
            / 1e18;

        Ok(ReputationSummary { mean, count })
    }
}
