//! Metadata card resolution through a gateway cascade.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};
use warden_chain::ChainApi;

/// Per-gateway cap; the cascade as a whole is bounded by gateways × this.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Public fallbacks tried after the configured primary, in order.
const FALLBACK_GATEWAYS: [&str; 3] = [
    "https://ipfs.io",
    "https://cloudflare-ipfs.com",
    "https://gateway.pinata.cloud",
];

pub struct CardResolver {
    client: Client,
    gateways: Vec<String>,
}

impl CardResolver {
    pub fn new(primary_gateway: &str) -> Self {
        let client = Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .user_agent("warden-oracle/0.1")
            .build()
            .expect("failed to create metadata HTTP client");

        let primary = primary_gateway.trim_end_matches('/').to_string();
        let mut gateways = vec![primary.clone()];
        for fallback in FALLBACK_GATEWAYS {
            if fallback != primary {
                gateways.push(fallback.to_string());
            }
        }

        Self { client, gateways }
    }

    /// Resolver over an explicit gateway list, bypassing the public
    /// fallbacks. Used by deployments with private mirrors and by tests.
    pub fn with_gateways(gateways: Vec<String>) -> Self {
        let client = Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .user_agent("warden-oracle/0.1")
            .build()
            .expect("failed to create metadata HTTP client");
        Self { client, gateways }
    }

    /// Fetch the agent's card: `tokenURI` from the chain, then the gateway
    /// cascade. Returns `None` on an empty URI, on chain failure, or when
    /// every gateway is exhausted — never an error.
    pub async fn resolve_card(&self, chain: &dyn ChainApi, agent_id: u64) -> Option<Value> {
        let uri = match chain.token_uri(agent_id).await {
            Ok(uri) => uri,
            Err(e) => {
                debug!("[Metadata] tokenURI({agent_id}) failed: {e}");
                return None;
            }
        };
        if uri.trim().is_empty() {
            return None;
        }
        self.fetch(&uri).await
    }

    /// Gateway cascade for one content URI. First 2xx JSON body wins.
    pub async fn fetch(&self, uri: &str) -> Option<Value> {
        let hash = uri.trim_start_matches("ipfs://");

        for gateway in &self.gateways {
            let url = gateway_url(gateway, hash);
            match timeout(GATEWAY_TIMEOUT, self.client.get(&url).send()).await {
                Ok(Ok(response)) if response.status().is_success() => {
                    match response.json::<Value>().await {
                        Ok(card) => {
                            debug!("[Metadata] Resolved {hash} via {gateway}");
                            return Some(card);
                        }
                        Err(e) => debug!("[Metadata] {gateway} returned non-JSON body: {e}"),
                    }
                }
                Ok(Ok(response)) => {
                    debug!("[Metadata] {gateway} returned {}", response.status());
                }
                Ok(Err(e)) => debug!("[Metadata] {gateway} request failed: {e}"),
                Err(_) => debug!("[Metadata] {gateway} timed out"),
            }
        }

        warn!("[Metadata] All gateways exhausted for {hash}");
        None
    }
}

fn gateway_url(gateway: &str, hash: &str) -> String {
    format!("{}/ipfs/{}", gateway.trim_end_matches('/'), hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_starts_with_primary_and_dedupes() {
        let resolver = CardResolver::new("https://ipfs.io/");
        assert_eq!(resolver.gateways[0], "https://ipfs.io");
        assert_eq!(resolver.gateways.len(), 3);

        let resolver = CardResolver::new("https://my-gateway.example");
        assert_eq!(resolver.gateways[0], "https://my-gateway.example");
        assert_eq!(resolver.gateways.len(), 4);
    }

    #[test]
    fn gateway_url_strips_prefixes() {
        assert_eq!(
            gateway_url("https://ipfs.io", "QmHash"),
            "https://ipfs.io/ipfs/QmHash"
        );
        let hash = "ipfs://QmHash".trim_start_matches("ipfs://");
        assert_eq!(hash, "QmHash");
    }

    #[tokio::test]
    async fn exhausted_cascade_is_none_not_an_error() {
        // both gateways refuse the connection immediately
        let resolver = CardResolver::with_gateways(vec![
            "http://127.0.0.1:1".to_string(),
            "http://127.0.0.1:2".to_string(),
        ]);
        assert!(resolver.fetch("ipfs://QmUnreachable").await.is_none());
    }
}
