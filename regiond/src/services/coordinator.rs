//! Sync coordinator
//!
//! Single-flight gate around the reconciliation engine. Cron and manual
//! triggers race to call `trigger()`; at most one pass runs at a time, and a
//! caller that loses the race gets `SyncError::Busy` immediately rather than
//! queueing. Interleaved passes against a moving local snapshot could
//! double-count or mis-deactivate rows, so the gate is not optional.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::{Mutex, RwLock};

use crate::models::{SyncResult, SyncStatus};
use crate::services::directory_client::DirectoryClient;
use crate::services::sync_engine::{self, SyncError};

/// Serializes reconciliation passes and keeps invocation bookkeeping
pub struct SyncCoordinator {
    client: DirectoryClient,
    db: SqlitePool,
    /// Upper bound on one whole pass (fetch + transactional write)
    run_deadline: Duration,
    /// Advisory single-flight gate; held for the duration of a pass
    gate: Mutex<()>,
    status: RwLock<SyncStatus>,
    last_synced_at: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
}

impl SyncCoordinator {
    pub fn new(client: DirectoryClient, db: SqlitePool, run_deadline: Duration) -> Self {
        Self {
            client,
            db,
            run_deadline,
            gate: Mutex::new(()),
            status: RwLock::new(SyncStatus::Idle),
            last_synced_at: RwLock::new(None),
            last_error: RwLock::new(None),
        }
    }

    /// Run one reconciliation pass, or fail fast with `Busy`
    ///
    /// On deadline expiry the in-flight pass is dropped; any open transaction
    /// rolls back, so no partial state is ever committed.
    pub async fn trigger(&self) -> Result<SyncResult, SyncError> {
        let Ok(_guard) = self.gate.try_lock() else {
            return Err(SyncError::Busy);
        };

        *self.status.write().await = SyncStatus::Running;

        let outcome = match tokio::time::timeout(
            self.run_deadline,
            sync_engine::run_sync(&self.client, &self.db),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SyncError::DeadlineExceeded),
        };

        match &outcome {
            Ok(_) => {
                *self.last_synced_at.write().await = Some(Utc::now());
                *self.last_error.write().await = None;
            }
            Err(e) => {
                *self.last_error.write().await = Some(e.to_string());
            }
        }

        *self.status.write().await = SyncStatus::Idle;

        outcome
    }

    pub async fn status(&self) -> SyncStatus {
        *self.status.read().await
    }

    pub async fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        *self.last_synced_at.read().await
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }
}
