//! Unregistration cascade.

use tracing::info;

use super::{cache_key_matches, core::StateStore};
use crate::error::{Result, StoreError};

impl StateStore {
    /// Remove every trace of an agent: its row, its health events, every
    /// cache entry whose key contains the agent id in a bounded position,
    /// and its suspicious counter. Returns the collections that had rows.
    ///
    /// Deletion is an explicit cascade driven here, not by row ownership;
    /// the collections only share the agent id as a foreign key.
    pub async fn delete_agent_data(&self, agent_id: &str) -> Result<Vec<&'static str>> {
        let mut touched = Vec::new();

        if self.get_agent(agent_id).await?.is_some() {
            self.conn
                .execute("DELETE FROM agents WHERE agent_id = ?", [agent_id])
                .await
                .map_err(|e| StoreError::query("failed to delete agent row", e))?;
            touched.push("agents");
        }

        if !self.get_health_history(agent_id, 1).await?.is_empty() {
            self.conn
                .execute("DELETE FROM health_events WHERE agent_id = ?", [agent_id])
                .await
                .map_err(|e| StoreError::query("failed to delete health events", e))?;
            touched.push("health_events");
        }

        let matching = self.cache_keys_for_agent(agent_id).await?;
        if !matching.is_empty() {
            for key in &matching {
                self.conn
                    .execute("DELETE FROM llm_cache WHERE key = ?", [key.as_str()])
                    .await
                    .map_err(|e| StoreError::query("failed to delete cache entry", e))?;
            }
            touched.push("llm_cache");
        }

        let counter = self.get_suspicious(agent_id).await?;
        if counter.total_seen > 0 || counter.consecutive > 0 {
            self.conn
                .execute(
                    "DELETE FROM suspicious_counters WHERE agent_id = ?",
                    [agent_id],
                )
                .await
                .map_err(|e| StoreError::query("failed to delete suspicious counter", e))?;
            touched.push("suspicious_counters");
        }

        info!(
            "[Store] Deleted agent {agent_id} data from {} collection(s)",
            touched.len()
        );
        Ok(touched)
    }

    async fn cache_keys_for_agent(&self, agent_id: &str) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query("SELECT key FROM llm_cache", ())
            .await
            .map_err(|e| StoreError::query("failed to list cache keys", e))?;

        let mut matching = Vec::new();
        while let Some(row) = rows.next().await? {
            let key: String = row
                .get(0)
                .map_err(|e| StoreError::generic_with_source("failed to read cache key", e))?;
            if cache_key_matches(&key, agent_id) {
                matching.push(key);
            }
        }
        Ok(matching)
    }
}
