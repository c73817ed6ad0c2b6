// src/services/play_count_service.rs
//
// Play-Count & Chart Accrual
//
// Credits real listens, adds hourly ambient plays, rolls the daily chart and
// keeps the recently-played history.
//
// CRITICAL RULES:
// - Play counts only ever grow
// - One credit attempt per listen session
// - The chart is recomputed only when a cutover boundary has passed

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Timelike, Utc};
use rand::Rng;

use crate::config::HubConfig;
use crate::domain::{ChartState, DailyChartTrack, Track};
use crate::error::{AppError, AppResult};
use crate::events::{DataChanged, EventBus, PlaysUpdated, ReleaseRemoved, SyncTopic, TrackRetired};
use crate::repositories::PlayCountRepository;
use crate::services::catalog_service::CatalogService;

/// Smallest and largest increment of a credited listen
const LISTEN_CREDIT_MIN: u64 = 100;
const LISTEN_CREDIT_MAX: u64 = 9_999;

/// Upper bound of the hourly ambient increment for a track with `plays`
pub fn ambient_increment_cap(plays: u64) -> u64 {
    match plays {
        0..=9_999 => 1_000,
        10_000..=99_999 => 6_000,
        100_000..=999_999 => 12_000,
        _ => 24_000,
    }
}

/// Current count of `track`. Another session may have persisted a higher
/// value than the one cached in this session's catalog view.
fn persisted_plays(counts: &HashMap<String, u64>, track: &Track) -> u64 {
    counts
        .get(&track.id)
        .copied()
        .unwrap_or(track.plays)
        .max(track.plays)
}

/// `YYYY-MM-DDTHH`, identifies one clock hour
fn hour_marker(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H").to_string()
}

// ============================================================================
// LISTEN SESSION
// ============================================================================

/// Listening progress on the track currently assigned to the player
#[derive(Debug, Clone, PartialEq)]
pub struct ListenSession {
    pub track_id: String,
    pub listened_secs: f64,
    last_position: Option<f64>,
    attempted: bool,
}

impl ListenSession {
    pub fn new(track_id: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            listened_secs: 0.0,
            last_position: None,
            attempted: false,
        }
    }

    /// Feed a playback position sample.
    ///
    /// Forward steps shorter than `max_gap` count as listening; seeks and
    /// rewinds do not. Returns true exactly once, when the accumulated time
    /// first exceeds `threshold`.
    pub fn observe(&mut self, position: f64, max_gap: f64, threshold: f64) -> bool {
        if let Some(last) = self.last_position {
            let delta = position - last;
            if delta > 0.0 && delta < max_gap {
                self.listened_secs += delta;
            }
        }
        self.last_position = Some(position);

        if !self.attempted && self.listened_secs > threshold {
            self.attempted = true;
            return true;
        }
        false
    }

    pub fn credit_attempted(&self) -> bool {
        self.attempted
    }
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct PlayCountService {
    play_repo: Arc<dyn PlayCountRepository>,
    catalog: Arc<CatalogService>,
    event_bus: Arc<EventBus>,
    config: HubConfig,
    session: Mutex<Option<ListenSession>>,
    /// Serializes read-modify-write of the persisted maps
    writes: Mutex<()>,
}

impl PlayCountService {
    pub fn new(
        play_repo: Arc<dyn PlayCountRepository>,
        catalog: Arc<CatalogService>,
        event_bus: Arc<EventBus>,
        config: HubConfig,
    ) -> Self {
        Self {
            play_repo,
            catalog,
            event_bus,
            config,
            session: Mutex::new(None),
            writes: Mutex::new(()),
        }
    }

    /// Removed releases and retired tracks leave the history
    pub fn register_event_handlers(self: &Arc<Self>) {
        let service = Arc::clone(self);
        self.event_bus.subscribe::<ReleaseRemoved, _>(move |event| {
            if let Err(e) = service.forget_tracks(&event.track_ids, true) {
                log::error!(
                    "[PLAYS] Failed to clean history of release {}: {}",
                    event.release_id,
                    e
                );
            }
        });

        let service = Arc::clone(self);
        self.event_bus.subscribe::<TrackRetired, _>(move |event| {
            if let Err(e) = service.forget_tracks(std::slice::from_ref(&event.track_id), false) {
                log::error!(
                    "[PLAYS] Failed to clean history of track {}: {}",
                    event.track_id,
                    e
                );
            }
        });
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listen_session(&self) -> MutexGuard<'_, Option<ListenSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // LISTEN CREDIT
    // ========================================================================

    /// A new track was assigned to the player
    pub fn start_listening(&self, track_id: &str) {
        *self.listen_session() = Some(ListenSession::new(track_id));
        log::debug!("[PLAYS] Listening to {}", track_id);
    }

    pub fn stop_listening(&self) {
        self.listen_session().take();
    }

    pub fn current_listen(&self) -> Option<ListenSession> {
        self.listen_session().clone()
    }

    /// Progress sample of the current track.
    /// Returns the new play count when this sample earned a credit.
    pub fn report_progress(&self, position_secs: f64) -> AppResult<Option<u64>> {
        self.report_progress_at(position_secs, Utc::now())
    }

    pub fn report_progress_at(
        &self,
        position_secs: f64,
        now: DateTime<Utc>,
    ) -> AppResult<Option<u64>> {
        let due = {
            let mut session = self.listen_session();
            match session.as_mut() {
                Some(s) => s
                    .observe(
                        position_secs,
                        self.config.max_progress_gap_secs,
                        self.config.listen_threshold_secs,
                    )
                    .then(|| s.track_id.clone()),
                None => None,
            }
        };

        match due {
            Some(track_id) => self.credit_listen_at(&track_id, now),
            None => Ok(None),
        }
    }

    /// Credit one listen of `track_id` unless it was already credited within
    /// its own duration. Returns the new play count when credited.
    pub fn credit_listen_at(&self, track_id: &str, now: DateTime<Utc>) -> AppResult<Option<u64>> {
        self.credit_listen_with(track_id, now, &mut rand::thread_rng())
    }

    pub fn credit_listen_with<R: Rng + ?Sized>(
        &self,
        track_id: &str,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> AppResult<Option<u64>> {
        let track = self
            .catalog
            .track(track_id)?
            .ok_or_else(|| AppError::not_found("track", track_id))?;

        let total = {
            let _guard = self.write_lock();
            let mut last_listen = self.play_repo.load_last_listen()?;
            let now_ms = now.timestamp_millis();
            if let Some(&last) = last_listen.get(track_id) {
                let cooldown_ms = (track.duration * 1000.0) as i64;
                if now_ms - last < cooldown_ms {
                    log::debug!("[PLAYS] {} already credited within its duration", track_id);
                    return Ok(None);
                }
            }

            let mut counts = self.play_repo.load_play_counts()?;
            let increment = rng.gen_range(LISTEN_CREDIT_MIN..=LISTEN_CREDIT_MAX);
            let total = persisted_plays(&counts, &track).saturating_add(increment);
            counts.insert(track_id.to_string(), total);
            self.play_repo.save_play_counts(&counts)?;

            last_listen.insert(track_id.to_string(), now_ms);
            self.play_repo.save_last_listen(&last_listen)?;
            total
        };

        log::info!("[PLAYS] Credited listen of {} ({} plays)", track_id, total);
        self.event_bus
            .emit(PlaysUpdated::new(vec![track_id.to_string()]));
        self.event_bus.emit(DataChanged::new(SyncTopic::TracksChanged));
        Ok(Some(total))
    }

    // ========================================================================
    // AMBIENT ACCRUAL
    // ========================================================================

    /// Add the hourly ambient plays if `now` is the configured minute and
    /// this clock hour has not been served yet. Returns whether it fired.
    pub fn ambient_tick_at(&self, now: DateTime<Utc>) -> AppResult<bool> {
        self.ambient_tick_with(now, &mut rand::thread_rng())
    }

    pub fn ambient_tick_with<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> AppResult<bool> {
        if now.minute() != self.config.ambient_tick_minute {
            return Ok(false);
        }
        let marker = hour_marker(now);

        let track_ids = {
            let _guard = self.write_lock();
            if self.play_repo.load_ambient_marker()?.as_deref() == Some(marker.as_str()) {
                return Ok(false);
            }

            let tracks = self.catalog.tracks()?;
            let mut counts = self.play_repo.load_play_counts()?;
            for track in &tracks {
                let base = persisted_plays(&counts, track);
                let increment = rng.gen_range(0..=ambient_increment_cap(base));
                let total = base.saturating_add(increment);
                counts.insert(track.id.clone(), total);
            }
            self.play_repo.save_play_counts(&counts)?;
            self.play_repo.save_ambient_marker(&marker)?;
            tracks.into_iter().map(|t| t.id).collect::<Vec<_>>()
        };

        log::info!(
            "[PLAYS] Ambient accrual for hour {} over {} tracks",
            marker,
            track_ids.len()
        );
        self.event_bus.emit(PlaysUpdated::new(track_ids));
        self.event_bus.emit(DataChanged::new(SyncTopic::TracksChanged));
        Ok(true)
    }

    // ========================================================================
    // DAILY CHART
    // ========================================================================

    /// The daily chart, rolled over first if a cutover passed
    pub fn daily_chart_at(&self, now: DateTime<Utc>) -> AppResult<Vec<DailyChartTrack>> {
        let _guard = self.write_lock();
        let mut state: ChartState = self.play_repo.load_chart_state()?;
        if state.is_due(now, self.config.chart_cutover_hour_utc) {
            let tracks = self.catalog.tracks()?;
            state.roll_over(&tracks, self.config.chart_size, now);
            self.play_repo.save_chart_state(&state)?;
            log::info!("[PLAYS] Daily chart rolled over ({} entries)", state.chart.len());
        }
        Ok(state.chart)
    }

    pub fn daily_chart(&self) -> AppResult<Vec<DailyChartTrack>> {
        self.daily_chart_at(Utc::now())
    }

    // ========================================================================
    // RECENTLY PLAYED
    // ========================================================================

    /// Push a track to the front of the history, most recent first
    pub fn record_play(&self, track: &Track) -> AppResult<Vec<Track>> {
        let _guard = self.write_lock();
        let mut recent = self.play_repo.load_recent()?;
        recent.retain(|t| t.id != track.id);
        recent.insert(0, track.clone());
        recent.truncate(self.config.recent_history_len);
        self.play_repo.save_recent(&recent)?;
        Ok(recent)
    }

    pub fn recent(&self) -> AppResult<Vec<Track>> {
        self.play_repo.load_recent()
    }

    /// Drop `track_ids` from the history; with `purge_counts` their persisted
    /// counters go as well.
    fn forget_tracks(&self, track_ids: &[String], purge_counts: bool) -> AppResult<()> {
        if track_ids.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock();

        let mut recent = self.play_repo.load_recent()?;
        let before = recent.len();
        recent.retain(|t| !track_ids.contains(&t.id));
        if recent.len() != before {
            self.play_repo.save_recent(&recent)?;
        }

        if purge_counts {
            let mut counts: HashMap<String, u64> = self.play_repo.load_play_counts()?;
            let mut last_listen = self.play_repo.load_last_listen()?;
            let mut changed = false;
            for id in track_ids {
                changed |= counts.remove(id).is_some();
                changed |= last_listen.remove(id).is_some();
            }
            if changed {
                self.play_repo.save_play_counts(&counts)?;
                self.play_repo.save_last_listen(&last_listen)?;
            }
        }

        log::debug!("[PLAYS] Forgot {} tracks", track_ids.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BaseCatalog;
    use crate::repositories::kv_store::test_support::memory_store;
    use crate::repositories::{KeyValueStore, KvPlayCountRepository, KvReleaseRepository};
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn setup() -> (Arc<PlayCountService>, Arc<KvPlayCountRepository>, Arc<EventBus>) {
        session_on(memory_store())
    }

    fn session_on(
        store: Arc<dyn KeyValueStore>,
    ) -> (Arc<PlayCountService>, Arc<KvPlayCountRepository>, Arc<EventBus>) {
        let bus = Arc::new(EventBus::new());
        let play_repo = Arc::new(KvPlayCountRepository::new(store.clone()));
        let catalog = Arc::new(CatalogService::new(
            Arc::new(BaseCatalog::seeded()),
            Arc::new(KvReleaseRepository::new(store)),
            play_repo.clone(),
            bus.clone(),
        ));
        catalog.register_event_handlers();
        let service = Arc::new(PlayCountService::new(
            play_repo.clone(),
            catalog,
            bus.clone(),
            HubConfig::default(),
        ));
        service.register_event_handlers();
        (service, play_repo, bus)
    }

    fn plays_of(service: &PlayCountService, id: &str) -> u64 {
        service.catalog.track(id).unwrap().unwrap().plays
    }

    #[test]
    fn test_listen_session_counts_only_small_forward_steps() {
        let mut session = ListenSession::new("t1");
        let mut credited = 0;
        let mut position = 0.0;
        session.observe(position, 1.5, 30.0);
        for _ in 0..30 {
            position += 1.0;
            credited += session.observe(position, 1.5, 30.0) as u32;
        }
        // seek forward and back, neither counts
        session.observe(120.0, 1.5, 30.0);
        session.observe(10.0, 1.5, 30.0);
        assert_eq!(session.listened_secs, 30.0);
        assert_eq!(credited, 0);

        assert!(session.observe(11.0, 1.5, 30.0));
        for i in 12..200 {
            assert!(!session.observe(i as f64, 1.5, 30.0));
        }
        assert!(session.credit_attempted());
    }

    #[test]
    fn test_report_progress_credits_once() {
        let (service, _, _) = setup();
        let before = plays_of(&service, "t1");
        let now = Utc::now();

        service.start_listening("t1");
        let mut credits = Vec::new();
        for i in 0..=80 {
            if let Some(total) = service.report_progress_at(i as f64 * 0.5, now).unwrap() {
                credits.push(total);
            }
        }

        assert_eq!(credits.len(), 1);
        let gained = credits[0] - before;
        assert!((LISTEN_CREDIT_MIN..=LISTEN_CREDIT_MAX).contains(&gained));
        assert_eq!(plays_of(&service, "t1"), credits[0]);
    }

    #[test]
    fn test_credit_respects_duration_cooldown() {
        let (service, _, _) = setup();
        let duration = service.catalog.track("t2").unwrap().unwrap().duration;
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();

        assert!(service.credit_listen_with("t2", now, &mut rng).unwrap().is_some());
        assert!(service
            .credit_listen_with("t2", now + Duration::seconds(10), &mut rng)
            .unwrap()
            .is_none());
        let later = now + Duration::seconds(duration as i64 + 1);
        assert!(service.credit_listen_with("t2", later, &mut rng).unwrap().is_some());
    }

    #[test]
    fn test_credits_from_other_sessions_are_never_lost() {
        let store = memory_store();
        let (first, repo, _) = session_on(store.clone());
        let (second, _, _) = session_on(store);
        let mut rng = StdRng::seed_from_u64(11);
        let now = Utc::now();

        let seed_plays = plays_of(&first, "t1");
        let duration = first.catalog.track("t1").unwrap().unwrap().duration;
        let remote = second
            .credit_listen_with("t1", now, &mut rng)
            .unwrap()
            .unwrap();
        assert!(remote > seed_plays);
        // first session still has the seed value cached
        assert_eq!(plays_of(&first, "t1"), seed_plays);

        let later = now + Duration::seconds(duration as i64 + 1);
        let local = first
            .credit_listen_with("t1", later, &mut rng)
            .unwrap()
            .unwrap();
        assert!(local > remote);
        assert_eq!(repo.load_play_counts().unwrap()["t1"], local);

        assert!(second
            .ambient_tick_with(at("2024-05-10T10:00:00Z"), &mut rng)
            .unwrap());
        assert!(repo.load_play_counts().unwrap()["t1"] >= local);
    }

    #[test]
    fn test_credit_unknown_track() {
        let (service, _, _) = setup();
        assert!(matches!(
            service.credit_listen_at("nope", Utc::now()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_ambient_increment_tiers() {
        assert_eq!(ambient_increment_cap(0), 1_000);
        assert_eq!(ambient_increment_cap(9_999), 1_000);
        assert_eq!(ambient_increment_cap(10_000), 6_000);
        assert_eq!(ambient_increment_cap(999_999), 12_000);
        assert_eq!(ambient_increment_cap(1_000_000), 24_000);
    }

    #[test]
    fn test_ambient_tick_fires_once_per_hour() {
        let (service, repo, _) = setup();
        let before: Vec<Track> = service.catalog.tracks().unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(!service
            .ambient_tick_with(at("2024-05-10T10:15:00Z"), &mut rng)
            .unwrap());
        assert!(service
            .ambient_tick_with(at("2024-05-10T10:00:05Z"), &mut rng)
            .unwrap());
        assert!(!service
            .ambient_tick_with(at("2024-05-10T10:00:40Z"), &mut rng)
            .unwrap());
        assert_eq!(
            repo.load_ambient_marker().unwrap().as_deref(),
            Some("2024-05-10T10")
        );

        let after = service.catalog.tracks().unwrap();
        for (old, new) in before.iter().zip(&after) {
            assert!(new.plays >= old.plays);
            assert!(new.plays - old.plays <= ambient_increment_cap(old.plays));
        }

        assert!(service
            .ambient_tick_with(at("2024-05-10T11:00:00Z"), &mut rng)
            .unwrap());
    }

    #[test]
    fn test_daily_chart_rolls_only_at_cutover() {
        let (service, repo, _) = setup();
        let first = service.daily_chart_at(at("2024-05-10T22:00:00Z")).unwrap();
        assert_eq!(first.len(), 20);
        // no baseline yet: deltas are full counts
        assert!(first.windows(2).all(|w| w[0].daily_plays >= w[1].daily_plays));

        let mut rng = StdRng::seed_from_u64(3);
        service
            .credit_listen_with("t5", at("2024-05-11T10:00:00Z"), &mut rng)
            .unwrap();
        let same_day = service.daily_chart_at(at("2024-05-11T20:59:00Z")).unwrap();
        assert_eq!(same_day, first);

        let next = service.daily_chart_at(at("2024-05-11T21:00:00Z")).unwrap();
        assert_eq!(next[0].track.id, "t5");
        assert!(next[1..].iter().all(|e| e.daily_plays == 0));
        assert_eq!(
            repo.load_chart_state().unwrap().last_rollover,
            Some(at("2024-05-11T21:00:00Z"))
        );
    }

    #[test]
    fn test_recent_history_is_deduplicated_and_bounded() {
        let (service, _, _) = setup();
        let tracks = service.catalog.tracks().unwrap();
        for track in tracks.iter().take(12) {
            service.record_play(track).unwrap();
        }
        let recent = service.record_play(&tracks[5]).unwrap();

        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, tracks[5].id);
        assert_eq!(recent.iter().filter(|t| t.id == tracks[5].id).count(), 1);
        assert_eq!(recent[1].id, tracks[11].id);
    }

    #[test]
    fn test_retired_and_removed_tracks_leave_history() {
        let (service, repo, bus) = setup();
        let tracks = service.catalog.tracks().unwrap();
        service.record_play(&tracks[0]).unwrap();
        service.record_play(&tracks[1]).unwrap();

        bus.emit(TrackRetired::new(tracks[0].id.clone()));
        assert_eq!(service.recent().unwrap().len(), 1);

        let mut counts = repo.load_play_counts().unwrap();
        counts.insert("dist_trk_rel_1_0".to_string(), 42);
        repo.save_play_counts(&counts).unwrap();
        bus.emit(ReleaseRemoved::new(
            "rel_1".to_string(),
            vec!["dist_trk_rel_1_0".to_string(), tracks[1].id.clone()],
        ));
        assert!(service.recent().unwrap().is_empty());
        assert!(!repo
            .load_play_counts()
            .unwrap()
            .contains_key("dist_trk_rel_1_0"));
    }
}
