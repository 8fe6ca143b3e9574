// In crates/engine/src/task.rs

use crate::cycle::{CycleDriver, CycleSnapshot};
use crate::failure::FailureTracker;
use crate::Result;
use chrono::Utc;
use core_types::Symbol;
use events::{Alert, EngineEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// The latest completed cycle. `None` until the first one succeeds.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<CycleSnapshot>>>;

/// A self-contained task that evaluates one symbol at a fixed cadence.
///
/// The next cycle starts `cadence` after the previous one finished, so
/// cycles never overlap. An aborted cycle leaves the published snapshot as
/// it was and never stops the loop.
pub struct TradingTask {
    driver: CycleDriver,
    cadence: Duration,
    failures: FailureTracker,
    snapshots: watch::Sender<Option<Arc<CycleSnapshot>>>,
}

impl TradingTask {
    pub fn new(driver: CycleDriver, cadence: Duration, max_consecutive_failures: u32) -> Self {
        let (snapshots, _) = watch::channel(None);
        Self {
            driver,
            cadence,
            failures: FailureTracker::new(max_consecutive_failures),
            snapshots,
        }
    }

    pub fn driver(&self) -> &CycleDriver {
        &self.driver
    }

    pub fn subscribe_snapshots(&self) -> SnapshotReceiver {
        self.snapshots.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.driver.subscribe_events()
    }

    /// Runs a single cycle and does the bookkeeping around it.
    ///
    /// A cycle whose orders the gateway rejected still publishes its
    /// snapshot, but counts as failed.
    pub async fn cycle(&mut self) -> Result<Arc<CycleSnapshot>> {
        let symbol = self.driver.params().symbol.clone();
        match self.driver.run_once().await {
            Ok(snapshot) => {
                if snapshot.rejected > 0 {
                    tracing::warn!(%symbol, rejected = snapshot.rejected, "Trading cycle had rejected orders.");
                    let reason = snapshot.issues.last().cloned().unwrap_or_default();
                    self.record_failure(&symbol, &reason);
                } else {
                    let streak = self.failures.record_success();
                    if streak > 0 {
                        tracing::info!(%symbol, failed_cycles = streak, "Trading cycle recovered.");
                    }
                }
                let snapshot = Arc::new(snapshot);
                self.driver.publish(EngineEvent::CycleCompleted(snapshot.summary()));
                self.snapshots.send_replace(Some(Arc::clone(&snapshot)));
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(%symbol, error = %e, "Trading cycle aborted.");
                self.record_failure(&symbol, &e.to_string());
                Err(e)
            }
        }
    }

    fn record_failure(&mut self, symbol: &Symbol, reason: &str) {
        if let Some(consecutive_failures) = self.failures.record_failure() {
            tracing::error!(%symbol, consecutive_failures, %reason, "Trading cycle keeps failing.");
            self.driver.publish(EngineEvent::Alert(Alert {
                time: Utc::now(),
                consecutive_failures,
                message: format!("{symbol}: {consecutive_failures} consecutive failed cycles, last error: {reason}"),
            }));
        }
    }

    /// The main, long-running loop. Only returns by being dropped.
    pub async fn run(mut self) {
        let p = self.driver.params();
        tracing::info!(
            symbol = %p.symbol,
            timeframe = %p.timeframe,
            cadence = ?self.cadence,
            gateway = self.driver.gateway().name(),
            "Starting trading task."
        );
        loop {
            // Errors are logged and counted inside `cycle`.
            let _ = self.cycle().await;
            tokio::time::sleep(self.cadence).await;
        }
    }
}
