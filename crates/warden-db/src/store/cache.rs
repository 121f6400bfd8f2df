//! TTL'd LLM response cache.
//!
//! Expiry is enforced on read: a past-deadline row is a miss and is deleted
//! lazily. `purge_expired` sweeps the rest once per monitoring cycle.

use serde_json::Value;
use tracing::debug;

use super::core::StateStore;
use crate::error::{Result, StoreError};

impl StateStore {
    /// Cache lookup. Past-deadline entries count as a miss.
    pub async fn get_cached(&self, key: &str) -> Result<Option<Value>> {
        let mut rows = self
            .conn
            .query(
                "SELECT value, expires_at FROM llm_cache WHERE key = ?",
                [key],
            )
            .await
            .map_err(|e| StoreError::query("failed to read cache entry", e))?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let raw: String = row
            .get(0)
            .map_err(|e| StoreError::generic_with_source("failed to read cache value", e))?;
        let expires_at: i64 = row
            .get(1)
            .map_err(|e| StoreError::generic_with_source("failed to read cache deadline", e))?;

        if expires_at <= Self::now() {
            debug!("[Store] Cache entry expired: {key}");
            self.conn
                .execute("DELETE FROM llm_cache WHERE key = ?", [key])
                .await
                .map_err(|e| StoreError::query("failed to evict expired cache entry", e))?;
            return Ok(None);
        }

        let value = serde_json::from_str(&raw)
            .map_err(|e| StoreError::serialization("corrupt cache value", e))?;
        Ok(Some(value))
    }

    /// Store with the configured TTL.
    pub async fn set_cached(&self, key: &str, value: &Value) -> Result<()> {
        self.set_cached_with_ttl(key, value, self.config.cache_ttl.as_secs() as i64)
            .await
    }

    pub async fn set_cached_with_ttl(&self, key: &str, value: &Value, ttl_secs: i64) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        let expires_at = Self::now() + ttl_secs;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO llm_cache (key, value, expires_at) VALUES (?, ?, ?)",
                [key.to_string(), raw, expires_at.to_string()],
            )
            .await
            .map_err(|e| StoreError::query("failed to write cache entry", e))?;
        Ok(())
    }

    /// Drop every entry past its deadline. Returns how many keys were swept.
    pub async fn purge_expired_cache(&self) -> Result<u64> {
        let now = Self::now();
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM llm_cache WHERE expires_at <= ?",
                [now.to_string()],
            )
            .await
            .map_err(|e| StoreError::query("failed to count expired cache entries", e))?;
        let expired: i64 = match rows.next().await? {
            Some(row) => row
                .get(0)
                .map_err(|e| StoreError::generic_with_source("failed to read expired count", e))?,
            None => 0,
        };

        if expired > 0 {
            self.conn
                .execute(
                    "DELETE FROM llm_cache WHERE expires_at <= ?",
                    [now.to_string()],
                )
                .await
                .map_err(|e| StoreError::query("failed to purge expired cache entries", e))?;
            debug!("[Store] Purged {expired} expired cache entries");
        }
        Ok(expired as u64)
    }
}

/// True when `key` contains `agent_id` in a bounded position: the whole key,
/// or a segment delimited by `_` or `:` separators.
pub(crate) fn cache_key_matches(key: &str, agent_id: &str) -> bool {
    key.split(['_', ':']).any(|segment| segment == agent_id)
}

#[cfg(test)]
mod tests {
    use super::cache_key_matches;

    #[test]
    fn matches_bounded_positions_only() {
        assert!(cache_key_matches("narrative:7", "7"));
        assert!(cache_key_matches("health:7:true:42", "7"));
        assert!(cache_key_matches("7", "7"));
        assert!(cache_key_matches("health_7_true", "7"));

        // 7 embedded in a longer token is not a match
        assert!(!cache_key_matches("narrative:17", "7"));
        assert!(!cache_key_matches("health:70:true:42", "7"));
        assert!(!cache_key_matches("onboard:agent7:https", "7"));
    }
}
