//! # warden-chain
//!
//! External collaborators the oracle reads from and writes to: the
//! blockchain (registry, health monitor and reputation contracts over
//! JSON-RPC) and the indexer's GraphQL endpoint.
//!
//! Both sides are exposed behind traits so the pipeline can be exercised
//! against mocks.

pub mod client;
pub mod contracts;
pub mod indexer;

pub use client::ChainClient;
pub use contracts::agent_id_from_topic;
pub use indexer::IndexerClient;

use anyhow::Result;
use async_trait::async_trait;
use warden_types::{MonitoredAgent, OnChainHealth, ReputationSummary, TxOutcome};

/// Chain reads and verdict transactions.
#[async_trait]
pub trait ChainApi: Send + Sync {
    async fn get_health_data(&self, agent_id: u64) -> Result<OnChainHealth>;
    async fn token_uri(&self, agent_id: u64) -> Result<String>;
    async fn owner_of(&self, agent_id: u64) -> Result<String>;
    async fn reputation_summary(&self, agent_id: u64) -> Result<ReputationSummary>;

    async fn update_health(
        &self,
        agent_id: u64,
        response_time_ms: u64,
        success: bool,
    ) -> Result<TxOutcome>;
    async fn report_suspicious(&self, agent_id: u64, reason: &str) -> Result<TxOutcome>;
}

/// Indexer queries the core consumes. Any error here makes the caller fall
/// back to the chain path.
#[async_trait]
pub trait IndexerApi: Send + Sync {
    async fn monitored_agents(&self, first: u32) -> Result<Vec<MonitoredAgent>>;
    async fn reputation_summary(&self, agent_id: &str) -> Result<ReputationSummary>;
}
