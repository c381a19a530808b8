//! regiond - Regional Directory Sync Service
//!
//! Maintains a local persisted copy of an externally-owned regional
//! directory. A reconciliation engine diffs the upstream snapshot against the
//! local store on a schedule (or on demand via POST /api/v1/regions/sync) and
//! applies the minimal insert/rename/deactivate set atomically.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use regiond::config::RegiondConfig;
use regiond::services::coordinator::SyncCoordinator;
use regiond::services::directory_client::DirectoryClient;
use regiond::services::scheduler::spawn_sync_scheduler;
use regiond::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting regiond (Regional Directory Sync) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = RegiondConfig::load()?;
    info!("Directory upstream: {}", config.directory_url);
    info!("Database: {}", config.database_path.display());

    let db_pool = regiond::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    let client = DirectoryClient::new(
        &config.directory_url,
        Duration::from_secs(config.fetch_timeout_secs),
    )?;

    let coordinator = Arc::new(SyncCoordinator::new(
        client,
        db_pool.clone(),
        Duration::from_secs(config.sync_deadline_secs),
    ));

    // Periodic trigger; manual triggers share the same coordinator
    spawn_sync_scheduler(
        coordinator.clone(),
        Duration::from_secs(config.sync_interval_secs),
    );
    info!(
        "Sync scheduler started (every {} seconds)",
        config.sync_interval_secs
    );

    let state = AppState::new(db_pool, coordinator);
    let app = regiond::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Listening on http://{}", config.listen_addr);
    info!("Health check: http://{}/health", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
