//! Monitored-agent discovery: indexer first, bounded chain scan on failure.

use tracing::{debug, warn};
use warden_chain::{ChainApi, IndexerApi};
use warden_types::FALLBACK_SCAN_LIMIT;

/// Indexer page size.
const DISCOVERY_LIMIT: u32 = 100;

/// The current monitored set as `(agent_id, endpoint)` pairs.
///
/// Called exactly once per cycle and never cached. Any indexer failure —
/// transport or malformed response — falls back to scanning token ids
/// `0..FALLBACK_SCAN_LIMIT` on-chain; agents with higher ids are invisible
/// on that path until the indexer recovers.
pub async fn list_monitored(
    indexer: &dyn IndexerApi,
    chain: &dyn ChainApi,
) -> Vec<(String, String)> {
    match indexer.monitored_agents(DISCOVERY_LIMIT).await {
        Ok(agents) => agents
            .into_iter()
            .map(|a| (a.agent_id, a.endpoint))
            .collect(),
        Err(e) => {
            warn!("[Discovery] Indexer unavailable, scanning chain: {e:#}");
            let mut monitored = Vec::new();
            for agent_id in 0..FALLBACK_SCAN_LIMIT {
                match chain.get_health_data(agent_id).await {
                    Ok(health) if health.is_monitored => {
                        monitored.push((agent_id.to_string(), health.endpoint));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // unminted ids revert; that is expected during the scan
                        debug!("[Discovery] getHealthData({agent_id}) failed: {e}");
                    }
                }
            }
            monitored
        }
    }
}
