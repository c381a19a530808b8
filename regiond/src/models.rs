//! Domain types for regiond

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Locally persisted regional record
///
/// `guid` is the storage identity, assigned on insert and never reused.
/// `external_id` is the upstream identifier; several rows may share it over
/// time (rename history), but at most one of them is active.
#[derive(Debug, Clone)]
pub struct Region {
    pub guid: Uuid,
    pub external_id: i64,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub superseded_at: Option<DateTime<Utc>>,
}

/// One record of the upstream directory snapshot
///
/// Wire format: `{"id": <integer>, "nome": <string>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEntry {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
}

impl RegionEntry {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Counters returned by one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// External ids seen for the first time
    pub inserted: u32,
    /// Renames, applied as supersession (old row deactivated, new row inserted)
    pub updated: u32,
    /// Active rows whose external id disappeared upstream
    pub deactivated: u32,
}

impl SyncResult {
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deactivated == 0
    }
}

/// Coordinator state, exposed via /health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Idle,
    Running,
}
