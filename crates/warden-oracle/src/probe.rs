//! HTTP probe client.

use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::time::timeout;
use tracing::debug;
use warden_types::ProbeResult;

/// Hard cap on one probe round trip.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Performs one GET against an agent's declared health endpoint.
#[derive(Clone)]
pub struct ProbeClient {
    client: Client,
}

impl ProbeClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .user_agent("warden-oracle/0.1")
            .build()
            .expect("failed to create probe HTTP client");
        Self { client }
    }

    /// One probe. Success iff the status is in [200, 300). Transport errors,
    /// timeouts and non-2xx statuses all come back as `success = false` with
    /// the elapsed wall time; this never returns an error.
    pub async fn probe(&self, endpoint: &str) -> ProbeResult {
        let start = Instant::now();

        let outcome = timeout(PROBE_TIMEOUT, async {
            let response = self.client.get(endpoint).send().await?;
            let status = response.status();
            if status.is_success() {
                let body = response.text().await.unwrap_or_default();
                Ok(body)
            } else {
                Err(anyhow::anyhow!("HTTP {status}"))
            }
        })
        .await;

        let response_time_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(body)) => {
                debug!("[Probe] {endpoint} ok in {response_time_ms}ms");
                ProbeResult {
                    success: true,
                    response_time_ms,
                    body: Some(body),
                }
            }
            Ok(Err(e)) => {
                debug!("[Probe] {endpoint} failed in {response_time_ms}ms: {e}");
                ProbeResult {
                    success: false,
                    response_time_ms,
                    body: None,
                }
            }
            Err(_) => {
                debug!("[Probe] {endpoint} timed out after {response_time_ms}ms");
                ProbeResult {
                    success: false,
                    response_time_ms,
                    body: None,
                }
            }
        }
    }
}

impl Default for ProbeClient {
    fn default() -> Self {
        Self::new()
    }
}
