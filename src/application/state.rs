// src/application/state.rs

use std::sync::Arc;

use crate::config::HubConfig;
use crate::domain::BaseCatalog;
use crate::error::AppResult;
use crate::events::EventBus;
use crate::repositories::{
    AccountRepository, KeyValueStore, KvAccountRepository, KvPlayCountRepository,
    KvReleaseRepository, PlayCountRepository, ReleaseRepository,
};
use crate::services::{CatalogService, LifecycleService, PlayCountService};

/// Application state of one session.
/// All fields are Arc-wrapped for thread-safe sharing across commands.
pub struct AppState {
    pub config: HubConfig,
    pub event_bus: Arc<EventBus>,
    pub lifecycle_service: Arc<LifecycleService>,
    pub catalog_service: Arc<CatalogService>,
    pub play_count_service: Arc<PlayCountService>,
}

impl AppState {
    /// Wire repositories and services over `store` and register every
    /// event handler.
    pub fn build(store: Arc<dyn KeyValueStore>, config: HubConfig) -> AppResult<Self> {
        let event_bus = Arc::new(EventBus::new());
        let base = Arc::new(BaseCatalog::seeded());

        // REPOSITORIES
        let account_repo: Arc<dyn AccountRepository> =
            Arc::new(KvAccountRepository::new(store.clone()));
        let release_repo: Arc<dyn ReleaseRepository> =
            Arc::new(KvReleaseRepository::new(store.clone()));
        let play_repo: Arc<dyn PlayCountRepository> = Arc::new(KvPlayCountRepository::new(store));

        // SERVICES
        let lifecycle_service = Arc::new(LifecycleService::new(
            account_repo,
            release_repo.clone(),
            base.clone(),
            event_bus.clone(),
        )?);
        let catalog_service = Arc::new(CatalogService::new(
            base,
            release_repo,
            play_repo.clone(),
            event_bus.clone(),
        ));
        let play_count_service = Arc::new(PlayCountService::new(
            play_repo,
            catalog_service.clone(),
            event_bus.clone(),
            config.clone(),
        ));

        // EVENT HANDLER REGISTRATION (WIRING)
        catalog_service.register_event_handlers();
        play_count_service.register_event_handlers();

        Ok(Self {
            config,
            event_bus,
            lifecycle_service,
            catalog_service,
            play_count_service,
        })
    }
}
