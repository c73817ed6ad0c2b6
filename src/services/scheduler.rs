// src/services/scheduler.rs
//
// Background Scheduler
//
// CRITICAL RULES:
// - Runs in background tasks
// - Each tick runs to completion before the task sleeps again
// - Tick failures are logged, never fatal
// - Tasks are aborted on stop() and on drop

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::config::HubConfig;
use crate::events::{SyncSubscription, SyncTopic};
use crate::services::catalog_service::CatalogService;
use crate::services::lifecycle::LifecycleService;
use crate::services::play_count_service::PlayCountService;

pub struct Scheduler {
    lifecycle: Arc<LifecycleService>,
    plays: Arc<PlayCountService>,
    catalog: Arc<CatalogService>,
    config: HubConfig,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Scheduler {
    pub fn new(
        lifecycle: Arc<LifecycleService>,
        plays: Arc<PlayCountService>,
        catalog: Arc<CatalogService>,
        config: HubConfig,
    ) -> Self {
        Self {
            lifecycle,
            plays,
            catalog,
            config,
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the publish and accrual loops, plus a sync listener when a
    /// subscription is given. Restarts cleanly if already running.
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>, sync: Option<SyncSubscription>) {
        self.stop();

        let mut handles = Vec::with_capacity(3);

        let scheduler = Arc::clone(self);
        let publish_every = Duration::from_secs(self.config.publish_interval_secs.max(1));
        handles.push(tokio::spawn(async move {
            loop {
                scheduler.run_publish_tick(Utc::now());
                tokio::time::sleep(publish_every).await;
            }
        }));

        let scheduler = Arc::clone(self);
        let accrue_every = Duration::from_secs(self.config.ambient_poll_secs.max(1));
        handles.push(tokio::spawn(async move {
            loop {
                scheduler.run_accrual_tick(Utc::now());
                tokio::time::sleep(accrue_every).await;
            }
        }));

        if let Some(mut subscription) = sync {
            let scheduler = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                while let Some(topic) = subscription.recv().await {
                    scheduler.handle_sync(topic);
                }
                log::info!("[SCHEDULER] Sync channel closed");
            }));
        }

        log::info!("[SCHEDULER] Started {} background tasks", handles.len());
        *self.tasks() = handles;
    }

    pub fn stop(&self) {
        let handles: Vec<JoinHandle<()>> = self.tasks().drain(..).collect();
        if handles.is_empty() {
            return;
        }
        for handle in &handles {
            handle.abort();
        }
        log::info!("[SCHEDULER] Stopped");
    }

    pub fn is_running(&self) -> bool {
        self.tasks().iter().any(|h| !h.is_finished())
    }

    // ========================================================================
    // TICKS
    // ========================================================================

    /// APPROVED -> LIVE sweep
    pub fn run_publish_tick(&self, now: DateTime<Utc>) {
        match self.lifecycle.publish_due_releases_at(now) {
            Ok(published) if !published.is_empty() => {
                log::info!("[SCHEDULER] Published: {}", published.join(", "));
            }
            Ok(_) => {}
            Err(e) => log::error!("[SCHEDULER] Publish sweep failed: {}", e),
        }
    }

    /// Hourly ambient accrual and daily chart rollover
    pub fn run_accrual_tick(&self, now: DateTime<Utc>) {
        if let Err(e) = self.plays.ambient_tick_at(now) {
            log::error!("[SCHEDULER] Ambient accrual failed: {}", e);
        }
        if let Err(e) = self.plays.daily_chart_at(now) {
            log::error!("[SCHEDULER] Chart rollover failed: {}", e);
        }
    }

    /// Another session wrote shared storage
    pub fn handle_sync(&self, topic: SyncTopic) {
        log::debug!("[SCHEDULER] Sync received: {:?}", topic);
        match self.lifecycle.reload(topic) {
            Ok(true) => log::info!("[SCHEDULER] Session invalidated by remote change"),
            Ok(false) => {}
            Err(e) => log::error!("[SCHEDULER] Reload after {:?} failed: {}", topic, e),
        }
        if topic == SyncTopic::TracksChanged {
            self.catalog.invalidate();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BaseCatalog, DistributionTrack, ReleaseDraft, ReleaseStatus, ReleaseType};
    use crate::events::{register_sync_handlers, EventBus, SyncHub};
    use crate::repositories::kv_store::test_support::memory_store;
    use crate::repositories::{
        KeyValueStore, KvAccountRepository, KvPlayCountRepository, KvReleaseRepository,
    };

    struct Node {
        bus: Arc<EventBus>,
        lifecycle: Arc<LifecycleService>,
        scheduler: Arc<Scheduler>,
    }

    fn node(store: &Arc<dyn KeyValueStore>, config: HubConfig) -> Node {
        let bus = Arc::new(EventBus::new());
        let base = Arc::new(BaseCatalog::seeded());
        let release_repo = Arc::new(KvReleaseRepository::new(store.clone()));
        let play_repo = Arc::new(KvPlayCountRepository::new(store.clone()));
        let lifecycle = Arc::new(
            LifecycleService::new(
                Arc::new(KvAccountRepository::new(store.clone())),
                release_repo.clone(),
                base.clone(),
                bus.clone(),
            )
            .unwrap(),
        );
        let catalog = Arc::new(CatalogService::new(base, release_repo, play_repo.clone(), bus.clone()));
        catalog.register_event_handlers();
        let plays = Arc::new(PlayCountService::new(
            play_repo,
            catalog.clone(),
            bus.clone(),
            config.clone(),
        ));
        let scheduler = Arc::new(Scheduler::new(lifecycle.clone(), plays, catalog, config));
        Node {
            bus,
            lifecycle,
            scheduler,
        }
    }

    fn fast_config() -> HubConfig {
        HubConfig {
            publish_interval_secs: 1,
            ambient_poll_secs: 1,
            ..HubConfig::default()
        }
    }

    async fn eventually<F: Fn() -> bool>(check: F) -> bool {
        for _ in 0..60 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        check()
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let store = memory_store();
        let n = node(&store, fast_config());
        assert!(!n.scheduler.is_running());
        n.scheduler.start(None);
        assert!(n.scheduler.is_running());
        n.scheduler.stop();
        assert!(!n.scheduler.is_running());
    }

    #[tokio::test]
    async fn test_publish_loop_promotes_due_release() {
        let store = memory_store();
        let n = node(&store, fast_config());
        n.lifecycle.register_moderator("mod", "pw").unwrap();
        n.lifecycle.login_moderator("mod", "pw").unwrap();

        let draft = ReleaseDraft {
            title: "Soon".to_string(),
            release_type: ReleaseType::Single,
            genre: "Jazz".to_string(),
            label: String::new(),
            covers: vec![],
            additional_main_artists: vec![],
            tracks: vec![DistributionTrack::new("One", "blob:one", 100.0)],
            release_date: Utc::now() + chrono::Duration::milliseconds(300),
            release_message: None,
        };
        let request = n.lifecycle.submit_release_as_moderator(draft, None).unwrap();
        n.lifecycle.approve_release(&request.id).unwrap();

        n.scheduler.start(None);
        let lifecycle = n.lifecycle.clone();
        let id = request.id.clone();
        assert!(
            eventually(|| {
                lifecycle
                    .all_releases()
                    .unwrap()
                    .iter()
                    .any(|r| r.id == id && r.status == ReleaseStatus::Live)
            })
            .await
        );
        n.scheduler.stop();
    }

    #[tokio::test]
    async fn test_sync_reloads_other_session() {
        let store = memory_store();
        let hub = SyncHub::new();
        let writer = node(&store, fast_config());
        let reader = node(&store, fast_config());

        register_sync_handlers(&writer.bus, hub.attach());
        reader.lifecycle.register_moderator("mod", "pw").unwrap();
        reader.lifecycle.login_moderator("mod", "pw").unwrap();
        reader.scheduler.start(Some(hub.attach().subscribe()));

        writer
            .lifecycle
            .register_artist("Remote", "remote", "pw")
            .unwrap();

        let lifecycle = reader.lifecycle.clone();
        assert!(eventually(|| lifecycle.pending_artists().unwrap().len() == 1).await);
        reader.scheduler.stop();
    }
}
