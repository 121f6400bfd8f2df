//! Agent record operations: document read, deep-merge upsert, bounded
//! probe-history push.

use tracing::debug;
use warden_types::{AgentPatch, AgentRecord, ProbeSample, RESPONSE_HISTORY_LIMIT};

use super::core::StateStore;
use crate::error::{Result, StoreError};

impl StateStore {
    pub async fn get_agent(&self, agent_id: &str) -> Result<Option<AgentRecord>> {
        let mut rows = self
            .conn
            .query("SELECT doc FROM agents WHERE agent_id = ?", [agent_id])
            .await
            .map_err(|e| StoreError::query("failed to read agent row", e))?;

        match rows.next().await? {
            Some(row) => {
                let doc: String = row
                    .get(0)
                    .map_err(|e| StoreError::generic_with_source("failed to read agent doc", e))?;
                let record = serde_json::from_str(&doc).map_err(|e| {
                    StoreError::serialization(format!("corrupt agent doc for {agent_id}"), e)
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Deep-merge upsert. Creates the row (initializing `created_at`) on
    /// first observation; only the fields present in `patch` are replaced.
    /// `updated_at` is stamped on every write.
    pub async fn upsert_agent(&self, agent_id: &str, patch: AgentPatch) -> Result<AgentRecord> {
        let now = Self::now();
        let mut record = match self.get_agent(agent_id).await? {
            Some(existing) => existing,
            None => {
                debug!("[Store] Creating agent row for {agent_id}");
                AgentRecord::new(agent_id, now)
            }
        };
        patch.apply(&mut record);
        record.updated_at = now;
        self.write_agent(&record).await?;
        Ok(record)
    }

    /// Append one probe sample, evicting the oldest beyond the bound.
    pub async fn push_response_history(
        &self,
        agent_id: &str,
        entry: ProbeSample,
    ) -> Result<AgentRecord> {
        let now = Self::now();
        let mut record = match self.get_agent(agent_id).await? {
            Some(existing) => existing,
            None => AgentRecord::new(agent_id, now),
        };
        record.response_history.push(entry);
        if record.response_history.len() > RESPONSE_HISTORY_LIMIT {
            let excess = record.response_history.len() - RESPONSE_HISTORY_LIMIT;
            record.response_history.drain(0..excess);
        }
        record.updated_at = now;
        self.write_agent(&record).await?;
        Ok(record)
    }

    pub(crate) async fn write_agent(&self, record: &AgentRecord) -> Result<()> {
        let doc = serde_json::to_string(record)?;
        self.conn
            .execute(
                "INSERT INTO agents (agent_id, doc, monitored, last_checked, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT(agent_id) DO UPDATE SET
                     doc = excluded.doc,
                     monitored = excluded.monitored,
                     last_checked = excluded.last_checked,
                     updated_at = excluded.updated_at",
                [
                    record.agent_id.clone(),
                    doc,
                    if record.monitored { "1" } else { "0" }.to_string(),
                    record.last_checked.unwrap_or(0).to_string(),
                    record.created_at.to_string(),
                    record.updated_at.to_string(),
                ],
            )
            .await
            .map_err(|e| StoreError::query("failed to write agent row", e))?;
        Ok(())
    }
}
