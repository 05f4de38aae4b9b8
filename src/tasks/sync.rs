//! Sync Trigger Task
//!
//! The headless host has no connectivity signal, so it fires every supported
//! deferred-sync tag on a timer instead.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::worker::Worker;

/// Spawns a background task that periodically drains the write queue.
///
/// Each tick drains every supported operation type independently. A halted
/// drain is simply retried on the next tick.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_sync_task(worker: Worker, sync_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sync_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting sync task with interval of {} seconds",
            sync_interval_secs
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let reports = worker.sync_all().await;
            let replayed: usize = reports.iter().map(|r| r.replayed).sum();
            let halted = reports.iter().filter(|r| r.needs_retry()).count();

            if replayed > 0 || halted > 0 {
                info!("Sync: replayed {} writes, {} types halted", replayed, halted);
            } else {
                debug!("Sync: nothing to replay");
            }
        }
    })
}
