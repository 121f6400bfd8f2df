//! Store connection and schema lifecycle.

use tracing::{debug, info};
use turso::{Builder, Connection};

use crate::{
    config::StoreConfig,
    error::{Result, StoreError},
};

/// Schema loaded from the external file at compile time.
const STORE_SCHEMA: &str = include_str!("../.schema/store_schema.sql");

/// Handle to the state store. One per process; the connection is serialized,
/// which is what makes the counter increment-then-reset pair atomic.
pub struct StateStore {
    pub(crate) conn: Connection,
    pub(crate) config: StoreConfig,
}

impl StateStore {
    /// Open (or create) the store and apply the schema.
    pub async fn open(config: StoreConfig) -> Result<Self> {
        debug!("[Store] Opening state store at {}", config.path);

        let db = Builder::new_local(&config.path).build().await.map_err(|e| {
            StoreError::connection_with_source(
                format!("failed to open database at {}", config.path),
                e,
            )
        })?;

        let conn = db.connect().map_err(|e| {
            StoreError::connection_with_source("failed to establish store connection", e)
        })?;

        let store = Self { conn, config };
        store.apply_schema().await?;
        Ok(store)
    }

    async fn apply_schema(&self) -> Result<()> {
        let schema_string = STORE_SCHEMA
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty() && !line.starts_with("--"))
            .collect::<Vec<&str>>()
            .join(" ");

        let statements: Vec<&str> = schema_string
            .split(';')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        for statement in statements {
            self.conn.execute(statement, ()).await.map_err(|e| {
                StoreError::schema_with_source(
                    format!("failed to execute schema statement: {statement}"),
                    e,
                )
            })?;
        }

        info!("[Store] Schema applied");
        Ok(())
    }

    /// Unix seconds now. Single definition so every collection stamps time
    /// the same way.
    pub(crate) fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Flush and release the connection. Called once on shutdown.
    pub async fn close(&self) -> Result<()> {
        debug!("[Store] Closing store connection");
        let _ = self.conn.execute("PRAGMA optimize", ()).await;
        Ok(())
    }
}
