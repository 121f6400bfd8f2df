//! Contract bindings and event helpers.

use alloy::{primitives::U256, sol};
use anyhow::{Context, Result};

sol! {
    #[sol(rpc)]
    contract HealthMonitor {
        function getHealthData(uint256 agentId) external view returns (
            uint8 healthScore,
            uint256 lastCheckTimestamp,
            uint256 totalChecks,
            uint256 successfulChecks,
            uint256 failedChecks,
            uint256 totalResponseTime,
            uint256 consecutiveFailures,
            bool isMonitored,
            uint256 stakedAmount,
            string endpoint
        );

        function updateHealth(uint256 agentId, uint256 responseTime, bool success) external;
        function reportSuspicious(uint256 agentId, string reason) external;
    }

    #[sol(rpc)]
    contract IdentityRegistry {
        function tokenURI(uint256 tokenId) external view returns (string uri);
        function ownerOf(uint256 tokenId) external view returns (address owner);
    }

    #[sol(rpc)]
    contract ReputationRegistry {
        function getSummary(uint256 agentId) external view returns (
            uint64 count,
            uint256 sum,
            uint256 mean,
            uint8 valueDecimals
        );
    }
}

/// Decode the agent id from the second indexed topic of a
/// `MonitoringEnabled(uint256 indexed agentId, string endpoint, uint256 stakedAmount)`
/// log, as delivered by the onboarding notification.
pub fn agent_id_from_topic(topic: &str) -> Result<u64> {
    let raw = topic.trim_start_matches("0x");
    let value = U256::from_str_radix(raw, 16)
        .with_context(|| format!("topic is not a uint256: {topic}"))?;
    u64::try_from(value).context("agent id exceeds u64")
}

/// Clamp a uint256 view value into u64. Counters in the health contract fit
/// comfortably; anything larger is saturated rather than trusted.
pub(crate) fn to_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Fixed-point 1e18 value to natural units.
pub(crate) fn from_fixed_1e18(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0) / 1e18
}
