//! Small key/value surfaces: cross-restart config and one-shot faucet claims.

use super::core::StateStore;
use crate::error::{Result, StoreError};

impl StateStore {
    /// Read-your-writes durable config value.
    pub async fn get_config(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM config WHERE key = ?", [key])
            .await
            .map_err(|e| StoreError::query("failed to read config value", e))?;

        match rows.next().await? {
            Some(row) => {
                let value: String = row.get(0).map_err(|e| {
                    StoreError::generic_with_source("failed to read config column", e)
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO config (key, value, updated_at) VALUES (?, ?, ?)",
                [key.to_string(), value.to_string(), Self::now().to_string()],
            )
            .await
            .map_err(|e| StoreError::query("failed to write config value", e))?;
        Ok(())
    }

    /// True when the address has already been served.
    pub async fn has_claimed(&self, address: &str) -> Result<bool> {
        let address = address.to_lowercase();
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM faucet_claims WHERE address = ?",
                [address.as_str()],
            )
            .await
            .map_err(|e| StoreError::query("failed to read faucet claim", e))?;
        Ok(rows.next().await?.is_some())
    }

    /// Record a claim. Returns false when the address had already claimed.
    pub async fn record_claim(&self, address: &str) -> Result<bool> {
        let address = address.to_lowercase();
        if self.has_claimed(&address).await? {
            return Ok(false);
        }
        self.conn
            .execute(
                "INSERT OR IGNORE INTO faucet_claims (address, claimed_at) VALUES (?, ?)",
                [address, Self::now().to_string()],
            )
            .await
            .map_err(|e| StoreError::query("failed to record faucet claim", e))?;
        Ok(true)
    }
}
