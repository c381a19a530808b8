//! Periodic sync scheduler
//!
//! Fire-and-forget cadence: call `trigger()` on a timer, log the outcome,
//! swallow errors. A tick that lands while a pass is in flight is skipped,
//! not queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::coordinator::SyncCoordinator;
use crate::services::sync_engine::SyncError;

/// Spawn the background sync loop
pub fn spawn_sync_scheduler(
    coordinator: Arc<SyncCoordinator>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick completes immediately; consume it so the first
        // scheduled pass runs one full interval after startup
        ticker.tick().await;

        loop {
            ticker.tick().await;

            tracing::info!("Starting scheduled regional sync");
            match coordinator.trigger().await {
                Ok(result) => {
                    tracing::info!(
                        inserted = result.inserted,
                        updated = result.updated,
                        deactivated = result.deactivated,
                        "Scheduled regional sync completed"
                    );
                }
                Err(SyncError::Busy) => {
                    tracing::debug!("Sync already in flight, skipping scheduled run");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Scheduled regional sync failed");
                }
            }
        }
    })
}
