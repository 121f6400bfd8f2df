//! Suspicious debounce counters.

use tracing::info;
use warden_types::SuspiciousCounter;

use super::core::StateStore;
use crate::error::{Result, StoreError};

impl StateStore {
    /// Record one suspicious verdict. Returns true iff the new consecutive
    /// count reached `threshold`, in which case the counter is reset to 0
    /// and `last_slashed_at` stamped before returning.
    ///
    /// The increment and the conditional reset run back-to-back on the
    /// store's single serialized connection, so no other writer can observe
    /// the intermediate value.
    pub async fn increment_suspicious(&self, agent_id: &str, threshold: u32) -> Result<bool> {
        let now = Self::now();
        self.conn
            .execute(
                "INSERT INTO suspicious_counters (agent_id, consecutive, last_at, total_seen)
                 VALUES (?, 1, ?, 1)
                 ON CONFLICT(agent_id) DO UPDATE SET
                     consecutive = consecutive + 1,
                     total_seen = total_seen + 1,
                     last_at = excluded.last_at",
                [agent_id.to_string(), now.to_string()],
            )
            .await
            .map_err(|e| StoreError::query("failed to increment suspicious counter", e))?;

        let counter = self.get_suspicious(agent_id).await?;
        if counter.consecutive >= threshold {
            self.conn
                .execute(
                    "UPDATE suspicious_counters
                     SET consecutive = 0, last_slashed_at = ? WHERE agent_id = ?",
                    [now.to_string(), agent_id.to_string()],
                )
                .await
                .map_err(|e| StoreError::query("failed to reset counter after threshold", e))?;
            info!(
                "[Store] Suspicious threshold reached for agent {agent_id} \
                 ({} consecutive)",
                counter.consecutive
            );
            return Ok(true);
        }
        Ok(false)
    }

    /// Current counter state; zeros when no row exists.
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

    /// Healthy verdict observed: consecutive back to 0. `total_seen` and
    /// `last_slashed_at` are untouched.
    pub async fn reset_suspicious(&self, agent_id: &str) -> Result<()> {
        self.conn
            .execute(
                "UPDATE suspicious_counters SET consecutive = 0 WHERE agent_id = ?",
                [agent_id],
            )
            .await
            .map_err(|e| StoreError::query("failed to reset suspicious counter", e))?;
        Ok(())
    }
}
