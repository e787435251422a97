//! Tick scheduler — owned handle over the aggregation/aging cycle
//!
//! The engine owns its scheduler instead of hanging work off an ambient
//! process-wide timer: `start()` spawns the task, `stop()` cancels and
//! joins it. Alert aging runs from the same tick as metric aggregation,
//! never from ingestion.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::FleetEngine;

/// Handle to the running tick task. Dropping the handle does not stop the
/// task; call [`stop`](SchedulerHandle::stop) for a clean shutdown, or
/// cancel the token it was started with.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<u64>,
}

impl SchedulerHandle {
    /// Cancel the tick loop and wait for it to finish.
    ///
    /// Returns the number of ticks executed.
    pub async fn stop(self) -> u64 {
        self.cancel.cancel();
        self.task.await.unwrap_or(0)
    }

    /// Wait for the tick loop to finish without cancelling it — it stops
    /// when the token it was started under is cancelled.
    ///
    /// Returns the number of ticks executed.
    pub async fn join(self) -> u64 {
        self.task.await.unwrap_or(0)
    }

    /// Token controlling this scheduler, for wiring into a parent
    /// shutdown sequence.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Start the periodic tick task for an engine.
///
/// `parent` scopes the scheduler to an outer lifecycle — cancelling the
/// parent stops the scheduler too.
pub fn start(engine: Arc<FleetEngine>, parent: &CancellationToken) -> SchedulerHandle {
    let cancel = parent.child_token();
    let task_cancel = cancel.clone();
    let period = engine.tick_interval();

    let task = tokio::spawn(async move {
        info!(period_ms = period.as_millis() as u64, "[Scheduler] Task starting");
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first interval tick completes immediately; consume it so the
        // first sample lands one full period after start.
        interval.tick().await;

        let mut ticks = 0u64;
        loop {
            tokio::select! {
                _ = task_cancel.cancelled() => {
                    info!(ticks, "[Scheduler] Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {
                    let sample = engine.tick();
                    ticks += 1;
                    debug!(
                        active = sample.active_vehicles,
                        anomalies = sample.anomalies_in_window,
                        efficiency = sample.efficiency_pct,
                        "tick"
                    );
                }
            }
        }
        ticks
    });

    SchedulerHandle { cancel, task }
}
