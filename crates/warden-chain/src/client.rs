//! JSON-RPC chain client: contract reads plus the two verdict transactions.

use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};
use warden_types::{OnChainHealth, ReputationSummary, TxOutcome};

use crate::{
    contracts::{from_fixed_1e18, to_u64, HealthMonitor, IdentityRegistry, ReputationRegistry},
    ChainApi,
};

/// Transport attempts per transaction. Receipt waits are unbounded; only the
/// submission path retries.
const TX_ATTEMPTS: u32 = 3;
const TX_BACKOFF: Duration = Duration::from_secs(2);

pub struct ChainClient {
    provider: DynProvider,
    health_monitor: Address,
    identity_registry: Address,
    reputation_registry: Address,
}

impl ChainClient {
    /// Build a signing provider from the configured RPC URL and private key.
    /// The signer is initialized once at startup and immutable afterwards.
    pub fn new(
        rpc_url: &str,
        private_key: &str,
        health_monitor: &str,
        identity_registry: &str,
        reputation_registry: &str,
    ) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .context("PRIVATE_KEY is not a valid secp256k1 key")?;
        info!("[Chain] Signer address: {}", signer.address());

        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(rpc_url.parse().context("RPC_URL is not a valid URL")?)
            .erased();

        Ok(Self {
            provider,
            health_monitor: health_monitor
                .parse()
                .context("HEALTH_MONITOR is not a valid address")?,
            identity_registry: identity_registry
                .parse()
                .context("IDENTITY_REGISTRY is not a valid address")?,
            reputation_registry: reputation_registry
                .parse()
                .context("REPUTATION_REGISTRY is not a valid address")?,
        })
    }
}

#[async_trait]
impl ChainApi for ChainClient {
    async fn get_health_data(&self, agent_id: u64) -> Result<OnChainHealth> {
        let contract = HealthMonitor::new(self.health_monitor, self.provider.clone());
        let data = contract
            .getHealthData(U256::from(agent_id))
            .call()
            .await
            .with_context(|| format!("getHealthData({agent_id}) failed"))?;

        Ok(OnChainHealth {
            health_score: data.healthScore,
            last_check_timestamp: to_u64(data.lastCheckTimestamp),
            total_checks: to_u64(data.totalChecks),
            successful_checks: to_u64(data.successfulChecks),
            failed_checks: to_u64(data.failedChecks),
            total_response_time: to_u64(data.totalResponseTime),
            consecutive_failures: to_u64(data.consecutiveFailures),
            is_monitored: data.isMonitored,
            staked_amount: data.stakedAmount.to_string(),
            endpoint: data.endpoint,
        })
    }

    async fn token_uri(&self, agent_id: u64) -> Result<String> {
        let contract = IdentityRegistry::new(self.identity_registry, self.provider.clone());
        let uri = contract
            .tokenURI(U256::from(agent_id))
            .call()
            .await
            .with_context(|| format!("tokenURI({agent_id}) failed"))?;
        Ok(uri)
    }

    async fn owner_of(&self, agent_id: u64) -> Result<String> {
        let contract = IdentityRegistry::new(self.identity_registry, self.provider.clone());
        let owner = contract
            .ownerOf(U256::from(agent_id))
            .call()
            .await
            .with_context(|| format!("ownerOf({agent_id}) failed"))?;
        Ok(owner.to_string())
    }

    async fn reputation_summary(&self, agent_id: u64) -> Result<ReputationSummary> {
        let contract = ReputationRegistry::new(self.reputation_registry, self.provider.clone());
        let summary = contract
            .getSummary(U256::from(agent_id))
            .call()
            .await
            .with_context(|| format!("getSummary({agent_id}) failed"))?;

        Ok(ReputationSummary {
            mean: from_fixed_1e18(summary.mean),
            count: summary.count,
        })
    }

    async fn update_health(
        &self,
        agent_id: u64,
        response_time_ms: u64,
        success: bool,
    ) -> Result<TxOutcome> {
        let contract = HealthMonitor::new(self.health_monitor, self.provider.clone());
        let mut last_err = None;

        for attempt in 1..=TX_ATTEMPTS {
            let pending = contract
                .updateHealth(
                    U256::from(agent_id),
                    U256::from(response_time_ms),
                    success,
                )
                .send()
                .await;

            match pending {
                Ok(pending) => {
                    let receipt = pending
                        .get_receipt()
                        .await
                        .context("updateHealth receipt failed")?;
                    info!(
                        "[Chain] updateHealth({agent_id}, {response_time_ms}, {success}) \
                         tx {} status {}",
                        receipt.transaction_hash,
                        receipt.status()
                    );
                    return Ok(TxOutcome {
                        hash: receipt.transaction_hash.to_string(),
                        success: receipt.status(),
                    });
                }
                Err(e) => {
                    warn!("[Chain] updateHealth attempt {attempt}/{TX_ATTEMPTS} failed: {e}");
                    last_err = Some(e);
                    if attempt < TX_ATTEMPTS {
                        tokio::time::sleep(TX_BACKOFF * attempt).await;
                    }
                }
            }
        }

        Err(last_err.expect("at least one attempt ran").into())
    }

    async fn report_suspicious(&self, agent_id: u64, reason: &str) -> Result<TxOutcome> {
        let contract = HealthMonitor::new(self.health_monitor, self.provider.clone());
        let mut last_err = None;

        for attempt in 1..=TX_ATTEMPTS {
            let pending = contract
                .reportSuspicious(U256::from(agent_id), reason.to_string())
                .send()
                .await;

            match pending {
                Ok(pending) => {
                    let receipt = pending
                        .get_receipt()
                        .await
                        .context("reportSuspicious receipt failed")?;
                    info!(
                        "[Chain] reportSuspicious({agent_id}) tx {} status {}",
                        receipt.transaction_hash,
                        receipt.status()
                    );
                    return Ok(TxOutcome {
                        hash: receipt.transaction_hash.to_string(),
                        success: receipt.status(),
                    });
                }
                Err(e) => {
                    warn!("[Chain] reportSuspicious attempt {attempt}/{TX_ATTEMPTS} failed: {e}");
                    last_err = Some(e);
                    if attempt < TX_ATTEMPTS {
                        tokio::time::sleep(TX_BACKOFF * attempt).await;
                    }
                }
            }
        }

        Err(last_err.expect("at least one attempt ran").into())
    }
}
