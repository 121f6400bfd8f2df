//! Read-only store access for the trust API.
//!
//! Holds its own connection so API traffic never contends with the
//! pipeline's writer; it exposes only the read path.

use warden_types::{AgentRecord, HealthEvent, SuspiciousCounter};

use crate::{
    config::StoreConfig,
    error::{Result, StoreError},
};

pub struct StoreReader {
    conn: turso::Connection,
}

impl StoreReader {
    pub fn new(conn: turso::Connection) -> Self {
        Self { conn }
    }

    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        let db = turso::Builder::new_local(&config.path)
            .build()
            .await
            .map_err(|e| {
                StoreError::connection_with_source(
                    format!("failed to open database at {}", config.path),
                    e,
                )
            })?;
        let conn = db.connect().map_err(|e| {
            StoreError::connection_with_source("failed to establish reader connection", e)
        })?;
        Ok(Self { conn })
    }

    /// Monitored agents ordered by most recently checked.
    pub async fn list_agents(&self, limit: u32) -> Result<Vec<AgentRecord>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT doc FROM agents WHERE monitored = 1
                     ORDER BY last_checked DESC LIMIT {limit}"
                ),
                (),
            )
            .await
            .map_err(|e| StoreError::query("failed to list agents", e))?;

        let mut agents = Vec::new();
        while let Some(row) = rows.next().await? {
            let doc: String = row
                .get(0)
                .map_err(|e| StoreError::generic_with_source("failed to read agent doc", e))?;
            agents.push(
                serde_json::from_str(&doc)
                    .map_err(|e| StoreError::serialization("corrupt agent doc", e))?,
            );
        }
        Ok(agents)
    }

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
                Ok(Some(serde_json::from_str(&doc).map_err(|e| {
                    StoreError::serialization(format!("corrupt agent doc for {agent_id}"), e)
                })?))
            }
            None => Ok(None),
        }
    }

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
            events.push(
                serde_json::from_str(&doc)
                    .map_err(|e| StoreError::serialization("corrupt health event doc", e))?,
            );
        }
        Ok(events)
    }

    pub async fn get_suspicious(&self, agent_id: &str) -> Result<SuspiciousCounter> {
        let mut rows = self
            .conn
            .query(
                "SELECT consecutive, last_at, total_seen, last_slashed_at
                 FROM suspicious_counters WHERE agent_id = ?",
                [agent_id],
            )
            .await
            .map_err(|e| StoreError::query("failed to read suspicious counter", e))?;

        let Some(row) = rows.next().await? else {
            return Ok(SuspiciousCounter::default());
        };

        let read_err = |e| StoreError::generic_with_source("failed to read counter column", e);
        let consecutive: i64 = row.get(0).map_err(read_err)?;
        let last_at: i64 = row.get(1).map_err(read_err)?;
        let total_seen: i64 = row.get(2).map_err(read_err)?;
        let last_slashed_at: i64 = row.get(3).map_err(read_err)?;

        Ok(SuspiciousCounter {
            consecutive: consecutive as u32,
            last_at,
            total_seen: total_seen as u64,
            last_slashed_at: (last_slashed_at != 0).then_some(last_slashed_at),
        })
    }
}
