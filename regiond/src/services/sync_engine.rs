//! Reconciliation engine
//!
//! One pass: fetch the upstream snapshot, diff it against the active local
//! rows, and apply the minimal set of insert/supersede/deactivate mutations
//! in a single transaction. Readers therefore observe either the pre-sync or
//! the post-sync state, never an interleaving.

use std::collections::HashMap;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::regions;
use crate::db::StoreError;
use crate::models::{RegionEntry, SyncResult};
use crate::services::directory_client::{DirectoryClient, FetchError};

/// Errors out of a reconciliation pass
#[derive(Debug, Error)]
pub enum SyncError {
    /// Upstream fetch failed; nothing was written locally
    #[error("directory fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Transactional write failed; the whole pass was rolled back
    #[error("store write failed: {0}")]
    Store(#[from] StoreError),

    /// A pass was already in flight when the trigger arrived
    #[error("a sync pass is already in flight")]
    Busy,

    /// The pass overran its deadline; the open transaction was rolled back
    #[error("sync pass exceeded its deadline")]
    DeadlineExceeded,
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::Store(StoreError::Database(e))
    }
}

/// Run one reconciliation pass: fetch, diff, apply
pub async fn run_sync(
    client: &DirectoryClient,
    pool: &SqlitePool,
) -> Result<SyncResult, SyncError> {
    tracing::info!("Starting regional synchronization");

    let snapshot = client.fetch_directory().await?;

    apply_snapshot(pool, &snapshot).await
}

/// Diff a snapshot against the active local rows and commit the mutations
///
/// Duplicate external ids within one snapshot: last occurrence wins (the
/// snapshot is deduped up front so the counters never double-count).
pub async fn apply_snapshot(
    pool: &SqlitePool,
    snapshot: &[RegionEntry],
) -> Result<SyncResult, SyncError> {
    let mut desired: HashMap<i64, &str> = HashMap::with_capacity(snapshot.len());
    for entry in snapshot {
        if desired.insert(entry.id, entry.name.as_str()).is_some() {
            tracing::warn!(
                external_id = entry.id,
                "Duplicate external id in snapshot, keeping last occurrence"
            );
        }
    }

    let mut tx = pool.begin().await?;

    let active = regions::load_active(&mut tx).await?;
    let local: HashMap<i64, &crate::models::Region> =
        active.iter().map(|r| (r.external_id, r)).collect();

    let mut result = SyncResult::default();

    for (&id, &name) in &desired {
        match local.get(&id) {
            None => {
                regions::insert_region(&mut tx, id, name).await?;
                result.inserted += 1;
                tracing::debug!(external_id = id, name = name, "Inserted new region");
            }
            Some(existing) if existing.name != name => {
                // Rename is supersession: the old row is kept as history
                regions::deactivate_region(&mut tx, existing.guid).await?;
                regions::insert_region(&mut tx, id, name).await?;
                result.updated += 1;
                tracing::debug!(
                    external_id = id,
                    old_name = %existing.name,
                    new_name = name,
                    "Superseded renamed region"
                );
            }
            Some(_) => {}
        }
    }

    for region in &active {
        if !desired.contains_key(&region.external_id) {
            regions::deactivate_region(&mut tx, region.guid).await?;
            result.deactivated += 1;
            tracing::debug!(
                external_id = region.external_id,
                name = %region.name,
                "Deactivated region absent upstream"
            );
        }
    }

    tx.commit().await?;

    tracing::info!(
        inserted = result.inserted,
        updated = result.updated,
        deactivated = result.deactivated,
        "Regional synchronization completed"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionEntry;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn snapshot(entries: &[(i64, &str)]) -> Vec<RegionEntry> {
        entries
            .iter()
            .map(|&(id, name)| RegionEntry::new(id, name))
            .collect()
    }

    async fn active_pairs(pool: &SqlitePool) -> Vec<(i64, String)> {
        let mut pairs: Vec<(i64, String)> = regions::list_active(pool)
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.external_id, r.name))
            .collect();
        pairs.sort();
        pairs
    }

    #[tokio::test]
    async fn test_insert_into_empty_store() {
        let pool = test_pool().await;

        let result = apply_snapshot(&pool, &snapshot(&[(1, "North"), (2, "South")]))
            .await
            .unwrap();

        assert_eq!(
            result,
            SyncResult {
                inserted: 2,
                updated: 0,
                deactivated: 0
            }
        );
        assert_eq!(
            active_pairs(&pool).await,
            vec![(1, "North".to_string()), (2, "South".to_string())]
        );
    }

    #[tokio::test]
    async fn test_identical_snapshot_is_noop() {
        let pool = test_pool().await;
        let snap = snapshot(&[(1, "North"), (2, "South")]);

        apply_snapshot(&pool, &snap).await.unwrap();
        let second = apply_snapshot(&pool, &snap).await.unwrap();

        assert!(second.is_noop());
        assert_eq!(active_pairs(&pool).await.len(), 2);
    }

    #[tokio::test]
    async fn test_rename_supersedes_old_row() {
        let pool = test_pool().await;
        apply_snapshot(&pool, &snapshot(&[(1, "North")])).await.unwrap();
        let old = regions::list_active(&pool).await.unwrap().remove(0);

        let result = apply_snapshot(&pool, &snapshot(&[(1, "Northeast")]))
            .await
            .unwrap();

        assert_eq!(
            result,
            SyncResult {
                inserted: 0,
                updated: 1,
                deactivated: 0
            }
        );

        let active = regions::list_active(&pool).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Northeast");
        assert_eq!(active[0].external_id, 1);
        assert_ne!(active[0].guid, old.guid);

        // Two rows of history for the external id
        assert_eq!(
            regions::count_rows_for_external_id(&pool, 1).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_old_row_never_reactivated_when_name_reintroduced() {
        let pool = test_pool().await;
        apply_snapshot(&pool, &snapshot(&[(1, "North")])).await.unwrap();
        let first = regions::list_active(&pool).await.unwrap().remove(0);

        apply_snapshot(&pool, &snapshot(&[(1, "Northeast")])).await.unwrap();
        let result = apply_snapshot(&pool, &snapshot(&[(1, "North")]))
            .await
            .unwrap();

        assert_eq!(result.updated, 1);

        let active = regions::list_active(&pool).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "North");
        // A fresh row, not the original one flipped back on
        assert_ne!(active[0].guid, first.guid);
        assert_eq!(
            regions::count_rows_for_external_id(&pool, 1).await.unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn test_absent_ids_are_deactivated() {
        let pool = test_pool().await;
        apply_snapshot(&pool, &snapshot(&[(1, "North"), (2, "South")]))
            .await
            .unwrap();

        let result = apply_snapshot(&pool, &snapshot(&[(1, "North")]))
            .await
            .unwrap();

        assert_eq!(
            result,
            SyncResult {
                inserted: 0,
                updated: 0,
                deactivated: 1
            }
        );
        assert_eq!(active_pairs(&pool).await, vec![(1, "North".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_snapshot_deactivates_everything() {
        let pool = test_pool().await;
        apply_snapshot(&pool, &snapshot(&[(1, "North"), (2, "South")]))
            .await
            .unwrap();

        let result = apply_snapshot(&pool, &[]).await.unwrap();

        assert_eq!(result.deactivated, 2);
        assert_eq!(result.inserted, 0);
        assert!(active_pairs(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_last_occurrence_wins() {
        let pool = test_pool().await;

        let result = apply_snapshot(&pool, &snapshot(&[(1, "North"), (1, "Norte")]))
            .await
            .unwrap();

        assert_eq!(result.inserted, 1);
        assert_eq!(active_pairs(&pool).await, vec![(1, "Norte".to_string())]);
    }

    #[tokio::test]
    async fn test_mixed_pass_counts_each_kind_once() {
        let pool = test_pool().await;
        apply_snapshot(
            &pool,
            &snapshot(&[(1, "North"), (2, "South"), (3, "East")]),
        )
        .await
        .unwrap();

        // 1 unchanged, 2 renamed, 3 removed, 4 new
        let result = apply_snapshot(
            &pool,
            &snapshot(&[(1, "North"), (2, "South Coast"), (4, "West")]),
        )
        .await
        .unwrap();

        assert_eq!(
            result,
            SyncResult {
                inserted: 1,
                updated: 1,
                deactivated: 1
            }
        );
        assert_eq!(
            active_pairs(&pool).await,
            vec![
                (1, "North".to_string()),
                (2, "South Coast".to_string()),
                (4, "West".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_at_most_one_active_row_per_external_id_across_passes() {
        let pool = test_pool().await;

        apply_snapshot(&pool, &snapshot(&[(1, "A"), (2, "B")])).await.unwrap();
        apply_snapshot(&pool, &snapshot(&[(1, "A2"), (2, "B")])).await.unwrap();
        apply_snapshot(&pool, &snapshot(&[(2, "B2")])).await.unwrap();
        apply_snapshot(&pool, &snapshot(&[(1, "A3"), (2, "B2")])).await.unwrap();

        for id in [1, 2] {
            let active: Vec<_> = regions::list_active(&pool)
                .await
                .unwrap()
                .into_iter()
                .filter(|r| r.external_id == id)
                .collect();
            assert!(active.len() <= 1, "external id {} has {} active rows", id, active.len());
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_store_untouched() {
        let pool = test_pool().await;
        apply_snapshot(&pool, &snapshot(&[(1, "North")])).await.unwrap();
        let before = active_pairs(&pool).await;

        // Unreachable upstream: the fetch fails before any local mutation
        let client = DirectoryClient::new(
            "http://127.0.0.1:1",
            std::time::Duration::from_secs(2),
        )
        .unwrap();
        let err = run_sync(&client, &pool).await;
        assert!(matches!(err, Err(SyncError::Fetch(_))));

        assert_eq!(active_pairs(&pool).await, before);
    }
}
