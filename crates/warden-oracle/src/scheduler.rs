//! Cycle clock.
//!
//! One tick per interval, first tick at startup, ticks dropped (not queued)
//! while a cycle is in flight, and no catch-up for missed ticks. Shutdown
//! lets the current cycle drain.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::pipeline::Orchestrator;

pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Run until the shutdown signal flips. Returns after the in-flight
    /// cycle (if any) has drained.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        info!(
            "[Scheduler] Starting with a {}s cycle interval",
            self.interval.as_secs()
        );
        let orchestrator = self.orchestrator.clone();
        run_loop(self.interval, shutdown, move || {
            let orchestrator = orchestrator.clone();
            async move { orchestrator.run_cycle().await }
        })
        .await;
        info!("[Scheduler] Stopped");
    }
}

/// The tick loop, factored out so the overlap and shutdown behavior can be
/// exercised without a full pipeline.
///
/// Cycles run inline on this task: a tick that lands while a cycle is still
/// awaited is a missed tick, and `MissedTickBehavior::Skip` drops it instead
/// of queueing a burst. Two cycles can therefore never be in flight at once.
pub async fn run_loop<F, Fut>(
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut cycle: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                cycle().await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("[Scheduler] Shutdown requested, draining");
                    break;
                }
            }
        }
    }
}
