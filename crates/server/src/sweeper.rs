//! Periodic removal of stale retrieval artifacts.

use std::sync::Arc;
use std::time::Duration;

use clipfetch_core::Orchestrator;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sweeps the temp root on a fixed interval until cancelled.
///
/// The first sweep runs immediately, which clears leftovers from a
/// previous process that did not shut down cleanly.
pub struct Sweeper {
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
    max_age: Duration,
}

impl Sweeper {
    pub fn new(orchestrator: Arc<Orchestrator>, interval: Duration, max_age: Duration) -> Self {
        Self {
            orchestrator,
            interval,
            max_age,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!(
            "Artifact sweeper started (every {:?}, max age {:?})",
            self.interval, self.max_age
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.sweep_once().await,
            }
        }
        info!("Artifact sweeper stopped");
    }

    async fn sweep_once(&self) {
        match self.orchestrator.janitor().sweep_stale(self.max_age).await {
            Ok(report) => debug!(
                "Sweep finished: {} file(s), {} dir(s), {} bytes",
                report.files_removed, report.dirs_removed, report.bytes_freed
            ),
            Err(e) => warn!("Artifact sweep failed: {}", e),
        }
    }
}
