//! Regions API handlers
//!
//! GET /api/v1/regions, POST /api/v1/regions/sync

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::regions;
use crate::error::ApiResult;
use crate::models::SyncResult;
use crate::AppState;

/// One active region as exposed to read-side consumers
#[derive(Debug, Serialize)]
pub struct RegionResponse {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

/// GET /api/v1/regions
///
/// All currently active regions, projected as (id, name). Readers never
/// invoke the sync engine; they only see committed state.
pub async fn list_regions(State(state): State<AppState>) -> ApiResult<Json<Vec<RegionResponse>>> {
    let active = regions::list_active(&state.db).await?;

    Ok(Json(
        active
            .into_iter()
            .map(|r| RegionResponse {
                id: r.external_id,
                name: r.name,
                active: r.active,
            })
            .collect(),
    ))
}

/// POST /api/v1/regions/sync
///
/// Manual trigger. Returns the pass counters, or 409 CONFLICT when a pass is
/// already in flight (the caller can retry later).
pub async fn trigger_sync(State(state): State<AppState>) -> ApiResult<Json<SyncResult>> {
    tracing::info!("Manual regional sync requested");

    let result = state.coordinator.trigger().await?;

    Ok(Json(result))
}

/// Build region routes
pub fn region_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/regions", get(list_regions))
        .route("/api/v1/regions/sync", post(trigger_sync))
}
