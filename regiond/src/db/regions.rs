//! Regions table operations
//!
//! Mutating operations take `&mut SqliteConnection` so the sync engine can
//! run an entire reconciliation pass inside one transaction: either every
//! insert/deactivate of the pass commits, or none do.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Region;

/// Local store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

fn region_from_row(row: &SqliteRow) -> Result<Region, StoreError> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| StoreError::Corrupt(format!("guid {}: {}", guid_str, e)))?;

    let created_at = parse_timestamp(row.get("created_at"))?;
    let superseded_at = match row.get::<Option<String>, _>("superseded_at") {
        Some(ts) => Some(parse_timestamp(ts)?),
        None => None,
    };

    Ok(Region {
        guid,
        external_id: row.get("external_id"),
        name: row.get("name"),
        active: row.get::<i64, _>("active") != 0,
        created_at,
        superseded_at,
    })
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp {}: {}", raw, e)))
}

/// Load all active rows (the diff input for a reconciliation pass)
pub async fn load_active(conn: &mut SqliteConnection) -> Result<Vec<Region>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT guid, external_id, name, active, created_at, superseded_at
        FROM regions
        WHERE active = 1
        ORDER BY external_id
        "#,
    )
    .fetch_all(conn)
    .await?;

    rows.iter().map(region_from_row).collect()
}

/// Insert a new active row, assigning a fresh surrogate key
pub async fn insert_region(
    conn: &mut SqliteConnection,
    external_id: i64,
    name: &str,
) -> Result<Region, StoreError> {
    let region = Region {
        guid: Uuid::new_v4(),
        external_id,
        name: name.to_string(),
        active: true,
        created_at: Utc::now(),
        superseded_at: None,
    };

    sqlx::query(
        r#"
        INSERT INTO regions (guid, external_id, name, active, created_at, superseded_at)
        VALUES (?, ?, ?, 1, ?, NULL)
        "#,
    )
    .bind(region.guid.to_string())
    .bind(region.external_id)
    .bind(&region.name)
    .bind(region.created_at.to_rfc3339())
    .execute(conn)
    .await?;

    Ok(region)
}

/// Flip a row to inactive, recording when it was superseded
///
/// Rows never flip back: history is append-only.
pub async fn deactivate_region(
    conn: &mut SqliteConnection,
    guid: Uuid,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        UPDATE regions
        SET active = 0, superseded_at = ?
        WHERE guid = ? AND active = 1
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .bind(guid.to_string())
    .execute(conn)
    .await?;

    Ok(())
}

/// Read surface: all currently active rows
pub async fn list_active(pool: &SqlitePool) -> Result<Vec<Region>, StoreError> {
    let mut conn = pool.acquire().await?;
    load_active(&mut conn).await
}

/// Count every row ever written for an external id (active or not)
pub async fn count_rows_for_external_id(
    pool: &SqlitePool,
    external_id: i64,
) -> Result<i64, StoreError> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM regions WHERE external_id = ?")
        .bind(external_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get("n"))
}
