//! TTL Prune Task
//!
//! Background task that periodically sweeps expired slots from a TTL table.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ttl::TtlTable;

// == Prune Handle ==
/// Owner's handle on a running prune task.
///
/// Dropping the handle does not stop the task. Call [`cancel`](Self::cancel)
/// or [`shutdown`](Self::shutdown), or cancel the token passed to
/// [`PruneScheduler::spawn`].
#[must_use = "the prune task keeps running until it is cancelled"]
#[derive(Debug)]
pub struct PruneHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PruneHandle {
    /// Stops the task before its next sweep. A sweep already running finishes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the task and waits for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "TTL prune task did not exit cleanly");
        }
    }
}

// == Prune Scheduler ==
/// Runs one sweep per interval for a single TTL table.
#[derive(Debug)]
pub struct PruneScheduler;

impl PruneScheduler {
    /// Spawns the prune loop for `table` on the current tokio runtime.
    ///
    /// The loop sleeps a full interval, sweeps, and repeats, so sweeps never
    /// overlap; a sweep slower than the interval pushes the next one back
    /// instead of queueing extra ticks. Each sweep runs on the blocking pool,
    /// since store calls are synchronous. A failed sweep is logged and retried
    /// on the next tick. The loop only ends when `cancel` fires.
    ///
    /// # Example
    /// ```ignore
    /// let cancel = CancellationToken::new();
    /// let handle = PruneScheduler::spawn(table.clone(), cancel.clone());
    /// // Later, during shutdown:
    /// handle.shutdown().await;
    /// ```
    pub fn spawn(table: Arc<TtlTable>, cancel: CancellationToken) -> PruneHandle {
        let task = tokio::spawn(run_prune_loop(table, cancel.clone()));
        PruneHandle { cancel, task }
    }
}

async fn run_prune_loop(table: Arc<TtlTable>, cancel: CancellationToken) {
    let interval = table.interval();
    info!(
        interval_ms = interval.as_millis() as u64,
        "Starting TTL prune task"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("TTL prune task shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        let started = Instant::now();
        let sweeping = Arc::clone(&table);
        let outcome = match tokio::task::spawn_blocking(move || sweeping.sweep()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "TTL prune sweep panicked, retrying next tick");
                continue;
            }
        };

        match outcome {
            Ok(report) if report.keys_removed > 0 => {
                info!(
                    removed = report.keys_removed,
                    slots = report.slots_swept,
                    pointer = report.cutoff,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "TTL prune: removed expired entries"
                );
            }
            Ok(report) => {
                debug!(
                    slots = report.slots_swept,
                    pointer = report.cutoff,
                    "TTL prune: no expired entries found"
                );
            }
            Err(e) => {
                warn!(error = %e, "TTL prune failed, retrying next tick");
            }
        }

        if started.elapsed() > interval {
            warn!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                interval_ms = interval.as_millis() as u64,
                "TTL prune slower than its interval, next sweep delayed"
            );
        }
    }
}
