//! Database access for regiond
//!
//! Owns the SQLite pool and the `regions` schema. All writes to the regions
//! table go through the sync engine; the API layer only reads.

pub mod regions;

pub use regions::StoreError;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Opens (or creates) the database file and ensures the schema exists.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the regions table and its invariant index
///
/// The partial unique index is what enforces "at most one active row per
/// external_id" at the constraint level; the engine never relies on
/// application-side checks alone.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS regions (
            guid TEXT PRIMARY KEY,
            external_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            superseded_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_regions_active_external_id
        ON regions(external_id) WHERE active = 1
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (regions)");

    Ok(())
}
