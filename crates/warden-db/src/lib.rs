//! # warden-db
//!
//! Durable state store for the monitoring oracle, backed by SQLite/Turso.
//!
//! Five logical collections: agent records (document-style rows with a
//! bounded rolling probe history), the append-only health event log, the
//! TTL'd LLM response cache, the per-agent suspicious debounce counters,
//! and small key/value surfaces (faucet claims, cross-restart config).
//!
//! The pipeline orchestrator is the sole writer for agents, history and
//! events; the diagnostic engine is the sole writer for the response cache.
//! The read-only trust API goes through [`StoreReader`].

pub mod config;
pub mod error;
pub mod reader;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use reader::StoreReader;
pub use store::StateStore;

/// Current library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
