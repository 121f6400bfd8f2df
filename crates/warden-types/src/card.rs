//! Agent metadata descriptors ("cards") resolved from content-addressed storage.

use serde::{Deserialize, Serialize};

/// Metadata card shape published at the agent's `tokenURI`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentCard {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub endpoint: String,
}

/// Service names that count as a health endpoint declaration.
const HEALTH_SERVICE_NAMES: [&str; 3] = ["status", "health", "ping"];

impl AgentCard {
    /// The declared health endpoint, if the card advertises one.
    pub fn health_endpoint(&self) -> Option<&str> {
        self.services
            .iter()
            .find(|s| HEALTH_SERVICE_NAMES.contains(&s.name.to_lowercase().as_str()))
            .map(|s| s.endpoint.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_endpoint_picks_known_service_names() {
        let card = AgentCard {
            services: vec![
                ServiceEntry {
                    name: "rpc".into(),
                    endpoint: "https://a.example/rpc".into(),
                },
                ServiceEntry {
                    name: "Status".into(),
                    endpoint: "https://a.example/status".into(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(card.health_endpoint(), Some("https://a.example/status"));
    }

    #[test]
    fn health_endpoint_none_when_undeclared() {
        let card = AgentCard::default();
        assert_eq!(card.health_endpoint(), None);
    }
}
