// src/main.rs
//
// Headless hub process: opens the shared database, wires one session and runs
// the background scheduler until Ctrl+C.

use std::sync::Arc;

use anyhow::Context;
use env_logger::Env;

use huevify_hub::application::state::AppState;
use huevify_hub::config::HubConfig;
use huevify_hub::db::{
    create_connection_pool, get_connection, get_database_path, get_database_stats,
    initialize_database, verify_database_integrity,
};
use huevify_hub::events::{register_sync_handlers, SyncHub};
use huevify_hub::repositories::{KeyValueStore, SqliteKeyValueStore};
use huevify_hub::services::Scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    // 1. CONFIGURATION
    let config = HubConfig::load().context("failed to load configuration")?;

    // 2. INFRASTRUCTURE
    let db_path = match &config.database_path {
        Some(path) => path.clone(),
        None => get_database_path()?,
    };
    let pool = Arc::new(
        create_connection_pool(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?,
    );
    {
        let conn = get_connection(&pool)?;
        initialize_database(&conn).context("failed to initialize schema")?;
        verify_database_integrity(&conn)?;
        let stats = get_database_stats(&conn)?;
        log::info!(
            "Database ready: {} keys, {} bytes",
            stats.key_count,
            stats.size_bytes
        );
    }
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::new(pool));

    // 3. SERVICES
    let state = AppState::build(store, config.clone())?;

    // 4. SYNC WIRING
    let hub = SyncHub::new();
    let sync = hub.attach();
    let subscription = sync.subscribe();
    register_sync_handlers(&state.event_bus, sync);

    // 5. BACKGROUND TASKS
    let scheduler = Arc::new(Scheduler::new(
        state.lifecycle_service.clone(),
        state.play_count_service.clone(),
        state.catalog_service.clone(),
        config,
    ));
    scheduler.start(Some(subscription));

    log::info!("Huevify hub running on {}", db_path.display());
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    log::info!("Shutting down");
    scheduler.stop();
    Ok(())
}
