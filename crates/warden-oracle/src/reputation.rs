//! Aggregated peer-feedback lookup: indexer first, chain view fallback.

use tracing::debug;
use warden_chain::{ChainApi, IndexerApi};
use warden_types::ReputationSummary;

/// Reputation for one agent, in natural units. Missing entities and total
/// failure both come back as zeros; reputation never blocks a cycle.
pub async fn fetch(
    indexer: &dyn IndexerApi,
    chain: &dyn ChainApi,
    agent_id: &str,
) -> ReputationSummary {
    match indexer.reputation_summary(agent_id).await {
        Ok(summary) => summary,
        Err(e) => {
            debug!("[Reputation] Indexer lookup for {agent_id} failed, trying chain: {e}");
            let Ok(id) = agent_id.parse::<u64>() else {
                return ReputationSummary::default();
            };
            chain.reputation_summary(id).await.unwrap_or_else(|e| {
                debug!("[Reputation] Chain lookup for {agent_id} failed: {e}");
                ReputationSummary::default()
            })
        }
    }
}
