//! Append-only health event log.

use warden_types::HealthEvent;

use super::core::StateStore;
use crate::error::{Result, StoreError};

impl StateStore {
    /// Insert one event with a server-side timestamp. Events are immutable;
    /// there is no update path.
    pub async fn log_health_event(&self, mut event: HealthEvent) -> Result<()> {
        event.ts = Self::now();
        let doc = serde_json::to_string(&event)?;
        self.conn
            .execute(
                "INSERT INTO health_events (agent_id, ts, decision, doc) VALUES (?, ?, ?, ?)",
                [
                    event.agent_id.clone(),
                    event.ts.to_string(),
                    event.decision.to_string(),
                    doc,
                ],
            )
            .await
            .map_err(|e| StoreError::query("failed to insert health event", e))?;
        Ok(())
    }

    /// Last `limit` events for one agent, newest first.
    pub async fn get_health_history(&self, agent_id: &str, limit: u32) -> Result<Vec<HealthEvent>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT doc FROM health_events WHERE agent_id = ?
                     ORDER BY ts DESC, id DESC LIMIT {limit}"
                ),
                [agent_id],
            )
            .await
            .map_err(|e| StoreError::query("failed to read health history", e))?;

        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            let doc: String = row
                .get(0)
                .map_err(|e| StoreError::generic_with_source("failed to read event doc", e))?;
            let event = serde_json::from_str(&doc)
                .map_err(|e| StoreError::serialization("corrupt health event doc", e))?;
            events.push(event);
        }
        Ok(events)
    }
}
