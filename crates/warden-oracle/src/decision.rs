//! Verdict execution: the chain action table and the suspicious debouncer.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use warden_chain::ChainApi;
use warden_db::StateStore;
use warden_types::{HealthDecision, ProbeResult, TxOutcome, Verdict, SLASH_THRESHOLD};

/// Execute one verdict:
///
/// * healthy — `updateHealth(id, ms, true)`, counter reset to 0
/// * suspicious — `updateHealth(id, ms, actual)`, counter incremented; at
///   the sixth consecutive strike `reportSuspicious` fires and the counter
///   resets in the same store operation
/// * critical — `updateHealth(id, 0, false)`, counter untouched
///
/// Chain failures are logged and swallowed; the next cycle re-evaluates.
/// A single model call can never slash: only the debouncer can.
pub async fn apply_verdict(
    chain: &dyn ChainApi,
    store: &StateStore,
    agent_id: &str,
    decision: &HealthDecision,
    probe: &ProbeResult,
) -> Result<()> {
    let id: u64 = agent_id
        .parse()
        .with_context(|| format!("agent id is not numeric: {agent_id}"))?;

    match decision.decision {
        Verdict::Healthy => {
            submit(
                "updateHealth",
                chain.update_health(id, probe.response_time_ms, true).await,
            );
            store
                .reset_suspicious(agent_id)
                .await
                .context("failed to reset suspicious counter")?;
        }
        Verdict::Suspicious => {
            submit(
                "updateHealth",
                chain
                    .update_health(id, probe.response_time_ms, probe.success)
                    .await,
            );
            let slashed = store
                .increment_suspicious(agent_id, SLASH_THRESHOLD)
                .await
                .context("failed to increment suspicious counter")?;
            if slashed {
                info!(
                    "[Decision] Agent {agent_id} hit {SLASH_THRESHOLD} consecutive \
                     suspicious verdicts, reporting"
                );
                submit(
                    "reportSuspicious",
                    chain.report_suspicious(id, &decision.chain_reason()).await,
                );
            }
        }
        Verdict::Critical => {
            submit("updateHealth", chain.update_health(id, 0, false).await);
        }
    }

    Ok(())
}

fn submit(label: &str, outcome: Result<TxOutcome>) {
    match outcome {
        Ok(tx) => debug!("[Decision] {label} tx {} success={}", tx.hash, tx.success),
        Err(e) => warn!("[Decision] {label} submission failed: {e:#}"),
    }
}
