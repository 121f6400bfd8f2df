//! Store configuration.

use std::time::Duration;

/// Configuration for the state-store connection.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database path, `:memory:`, or remote URL.
    pub path: String,
    /// Authentication token for remote databases.
    pub auth_token: Option<String>,
    /// Time-to-live applied by `set_cached`.
    pub cache_ttl: Duration,
}

impl StoreConfig {
    pub fn new<P: Into<String>>(path: P) -> Self {
        Self {
            path: path.into(),
            auth_token: None,
            cache_ttl: Duration::from_secs(300),
        }
    }

    pub fn with_auth_token(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn is_memory(&self) -> bool {
        self.path == ":memory:" || self.path.contains("mode=memory")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("warden.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = StoreConfig::new("test.db");
        assert_eq!(config.path, "test.db");
        assert!(config.auth_token.is_none());
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(!config.is_memory());
        assert!(StoreConfig::new(":memory:").is_memory());
    }
}
