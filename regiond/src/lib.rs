//! regiond library interface
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::coordinator::SyncCoordinator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (read surface)
    pub db: SqlitePool,
    /// Single-flight sync coordinator (manual trigger surface)
    pub coordinator: Arc<SyncCoordinator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, coordinator: Arc<SyncCoordinator>) -> Self {
        Self {
            db,
            coordinator,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::region_routes())
        .merge(api::health_routes())
        .with_state(state)
}
