// src/services/catalog_service.rs
//
// Catalog Merge Engine
//
// Combines the static base catalog with every visible release request into
// the effective track and album lists. The merge is a pure function of its
// inputs; the service only caches its last result.
//
// CRITICAL RULES:
// - Never mutates requests or accounts
// - One malformed request never aborts the merge
// - Album ids are `dist_alb_<request id>` and never duplicated

use chrono::{DateTime, Datelike, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::{Album, ArtistStats, BaseCatalog, CatalogView, ReleaseRequest, Track};
use crate::error::AppResult;
use crate::events::{CatalogInvalidated, EventBus, PlaysUpdated};
use crate::repositories::{PlayCountRepository, ReleaseRepository};

/// Rank reported for artists with no plays in the catalog
pub const UNRANKED: u32 = 999;

/// Share of total plays reported as monthly plays, in percent
const MONTHLY_PLAY_SHARE: u64 = 45;

// ============================================================================
// PURE MERGE
// ============================================================================

pub fn merge_catalog(
    base: &BaseCatalog,
    releases: &[ReleaseRequest],
    play_counts: &HashMap<String, u64>,
    retired: &BTreeSet<String>,
    now: DateTime<Utc>,
) -> CatalogView {
    let mut tracks: Vec<Track> = base
        .tracks
        .iter()
        .filter(|t| !retired.contains(&t.id))
        .cloned()
        .collect();
    let mut albums: Vec<Album> = base
        .albums
        .iter()
        .cloned()
        .map(|mut album| {
            album.track_ids.retain(|id| !retired.contains(id));
            album
        })
        .collect();
    let mut artists: BTreeSet<String> = BTreeSet::new();

    for request in releases.iter().filter(|r| r.is_visible_at(now)) {
        if request.id.trim().is_empty() {
            log::warn!("Skipping visible release '{}' with an empty id", request.title);
            continue;
        }
        if request.tracks.is_empty() {
            log::warn!("Skipping release '{}' without tracks", request.id);
            continue;
        }
        let album_id = request.album_id();
        if albums.iter().any(|a| a.id == album_id) {
            log::warn!("Release '{}' already merged, skipping duplicate", request.id);
            continue;
        }

        albums.push(merge_release(request, album_id, &mut tracks));
    }

    // pickers also offer artists whose releases are not public yet
    for request in releases {
        artists.insert(request.artist_name.clone());
        artists.extend(request.additional_main_artists.iter().cloned());
    }

    for track in &mut tracks {
        if let Some(&plays) = play_counts.get(&track.id) {
            track.plays = plays;
        }
    }

    for track in &tracks {
        artists.insert(track.artist.clone());
        artists.extend(track.main_artists.iter().cloned());
    }
    for album in &albums {
        artists.insert(album.artist.clone());
        artists.extend(album.main_artists.iter().cloned());
    }
    let artist_index = artists
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    CatalogView {
        tracks,
        albums,
        artist_index,
    }
}

/// Materialize one release into `tracks` and return its album
fn merge_release(request: &ReleaseRequest, album_id: String, tracks: &mut Vec<Track>) -> Album {
    let release_artists = dedup_names(
        std::iter::once(request.artist_name.as_str())
            .chain(request.additional_main_artists.iter().map(String::as_str)),
    );
    let cover = request.covers.first().cloned().unwrap_or_default();
    let mut track_ids = Vec::with_capacity(request.tracks.len());

    for (idx, draft) in request.tracks.iter().enumerate() {
        let genre = draft
            .genre
            .clone()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| request.genre.clone());

        if let Some(code) = draft.existing_reference() {
            let existing = tracks.iter_mut().find(|t| {
                t.hueq
                    .as_deref()
                    .is_some_and(|h| h.eq_ignore_ascii_case(code))
            });
            if let Some(existing) = existing {
                existing.genre = genre;
                existing.explicit = draft.explicit;
                track_ids.push(existing.id.clone());
                continue;
            }
            log::warn!(
                "Release '{}' track {} references unknown code {}, materializing",
                request.id,
                idx,
                code
            );
        }

        let id = request.track_id(idx);
        let main_artists = dedup_names(
            release_artists
                .iter()
                .map(String::as_str)
                .chain(draft.main_artists.iter().map(String::as_str)),
        );
        tracks.push(Track {
            id: id.clone(),
            title: draft.title.clone(),
            artist: draft
                .artist
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| request.artist_name.clone()),
            album: request.title.clone(),
            cover: cover.clone(),
            duration: draft.duration,
            url: draft.file_url.clone(),
            plays: 0,
            genre,
            explicit: draft.explicit,
            feat: draft.feat.clone(),
            hueq: draft
                .generated_hueq
                .clone()
                .or_else(|| draft.existing_reference().map(str::to_string)),
            main_artists,
        });
        track_ids.push(id);
    }

    Album {
        id: album_id,
        title: request.title.clone(),
        artist: request.artist_name.clone(),
        covers: request.covers.clone(),
        track_ids,
        year: request.release_date.year(),
        release_date: Some(request.release_date),
        record_label: Some(request.label.clone()).filter(|l| !l.trim().is_empty()),
        release_type: Some(request.release_type),
        main_artists: release_artists,
    }
}

/// Order-preserving, blank-free union of names
fn dedup_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .map(str::trim)
        .filter(|n| !n.is_empty() && seen.insert(n.to_string()))
        .map(str::to_string)
        .collect()
}

/// Monthly plays and global rank by primary-artist play totals
pub fn artist_stats(view: &CatalogView, artist_name: &str) -> ArtistStats {
    let mut totals: Vec<(&str, u64)> = Vec::new();
    for track in &view.tracks {
        match totals.iter_mut().find(|(name, _)| *name == track.artist) {
            Some((_, plays)) => *plays += track.plays,
            None => totals.push((track.artist.as_str(), track.plays)),
        }
    }
    // stable: ties keep first-appearance order
    totals.sort_by(|a, b| b.1.cmp(&a.1));

    let rank = totals.iter().position(|(name, _)| *name == artist_name);
    let total = rank.map(|idx| totals[idx].1).unwrap_or(0);
    ArtistStats {
        monthly_plays: total * MONTHLY_PLAY_SHARE / 100,
        global_rank: rank.map(|idx| idx as u32 + 1).unwrap_or(UNRANKED),
    }
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct CatalogService {
    base: Arc<BaseCatalog>,
    release_repo: Arc<dyn ReleaseRepository>,
    play_repo: Arc<dyn PlayCountRepository>,
    event_bus: Arc<EventBus>,
    cached: RwLock<Option<Arc<CatalogView>>>,
}

impl CatalogService {
    pub fn new(
        base: Arc<BaseCatalog>,
        release_repo: Arc<dyn ReleaseRepository>,
        play_repo: Arc<dyn PlayCountRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            base,
            release_repo,
            play_repo,
            event_bus,
            cached: RwLock::new(None),
        }
    }

    /// Drop the cached view whenever releases or plays change
    pub fn register_event_handlers(self: &Arc<Self>) {
        let service = Arc::clone(self);
        self.event_bus.subscribe::<CatalogInvalidated, _>(move |event| {
            log::debug!("[CATALOG] Invalidated: {}", event.reason);
            service.invalidate();
        });

        let service = Arc::clone(self);
        self.event_bus.subscribe::<PlaysUpdated, _>(move |_| {
            service.invalidate();
        });
    }

    pub fn base(&self) -> &BaseCatalog {
        &self.base
    }

    pub fn invalidate(&self) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Current effective catalog, merged on first access after a change
    pub fn view(&self) -> AppResult<Arc<CatalogView>> {
        if let Some(view) = self
            .cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(view));
        }
        self.refresh_at(Utc::now())
    }

    /// Re-merge from storage as of `now` and cache the result
    pub fn refresh_at(&self, now: DateTime<Utc>) -> AppResult<Arc<CatalogView>> {
        let releases = self.release_repo.list_releases()?;
        let retired = self.release_repo.list_retired_tracks()?;
        let plays = self.play_repo.load_play_counts()?;

        let view = Arc::new(merge_catalog(&self.base, &releases, &plays, &retired, now));
        log::debug!(
            "[CATALOG] Merged {} tracks, {} albums, {} artists",
            view.tracks.len(),
            view.albums.len(),
            view.artist_index.len()
        );
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&view));
        Ok(view)
    }

    pub fn tracks(&self) -> AppResult<Vec<Track>> {
        Ok(self.view()?.tracks.clone())
    }

    pub fn albums(&self) -> AppResult<Vec<Album>> {
        Ok(self.view()?.albums.clone())
    }

    pub fn artists(&self) -> AppResult<Vec<String>> {
        Ok(self.view()?.artist_index.clone())
    }

    pub fn track(&self, id: &str) -> AppResult<Option<Track>> {
        Ok(self.view()?.track(id).cloned())
    }

    pub fn album(&self, id: &str) -> AppResult<Option<Album>> {
        Ok(self.view()?.album(id).cloned())
    }

    pub fn track_by_hueq(&self, code: &str) -> AppResult<Option<Track>> {
        Ok(self.view()?.track_by_hueq(code).cloned())
    }

    pub fn artist_stats(&self, artist_name: &str) -> AppResult<ArtistStats> {
        let view = self.view()?;
        Ok(artist_stats(&view, artist_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DistributionTrack, ReleaseDraft, ReleaseStatus, ReleaseType};
    use crate::repositories::kv_store::test_support::memory_store;
    use crate::repositories::{KvPlayCountRepository, KvReleaseRepository};
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn release(id: &str, status: ReleaseStatus, date: DateTime<Utc>) -> ReleaseRequest {
        let mut track = DistributionTrack::new("Song", "blob:song", 200.0);
        track.main_artists = vec!["Guest".to_string()];
        let draft = ReleaseDraft {
            title: format!("Release {}", id),
            release_type: ReleaseType::Single,
            genre: "Pop".to_string(),
            label: "Indie".to_string(),
            covers: vec!["cover.png".to_string()],
            additional_main_artists: vec!["Co Artist".to_string()],
            tracks: vec![track],
            release_date: date,
            release_message: None,
        };
        let mut req = ReleaseRequest::submit(
            id.to_string(),
            "art_1".to_string(),
            "New Artist".to_string(),
            draft,
            date,
        );
        req.status = status;
        if matches!(status, ReleaseStatus::Approved | ReleaseStatus::Live) {
            req.tracks[0].generated_hueq = Some("123AB4".to_string());
        }
        req
    }

    #[test]
    fn test_base_catalog_only() {
        let base = BaseCatalog::seeded();
        let view = merge_catalog(&base, &[], &HashMap::new(), &BTreeSet::new(), Utc::now());
        assert_eq!(view.tracks.len(), 20);
        assert_eq!(view.albums.len(), 4);
        assert!(view.artist_index.contains(&"Binary Beats".to_string()));
    }

    #[test]
    fn test_live_release_materializes_album_and_tracks() {
        let now = at("2024-05-10T12:00:00Z");
        let base = BaseCatalog::seeded();
        let releases = vec![release("rel_1", ReleaseStatus::Live, now - Duration::days(1))];

        let view = merge_catalog(&base, &releases, &HashMap::new(), &BTreeSet::new(), now);

        let album = view.album("dist_alb_rel_1").unwrap();
        assert_eq!(album.track_ids, vec!["dist_trk_rel_1_0".to_string()]);
        assert_eq!(album.year, 2024);
        assert_eq!(album.main_artists, vec!["New Artist", "Co Artist"]);

        let track = view.track("dist_trk_rel_1_0").unwrap();
        assert_eq!(track.plays, 0);
        assert_eq!(track.hueq.as_deref(), Some("123AB4"));
        assert_eq!(track.artist, "New Artist");
        assert_eq!(track.main_artists, vec!["New Artist", "Co Artist", "Guest"]);
        assert!(view.artist_index.contains(&"Co Artist".to_string()));
    }

    #[test]
    fn test_only_visible_releases_merge() {
        let now = at("2024-05-10T12:00:00Z");
        let base = BaseCatalog::default();
        let releases = vec![
            release("pending", ReleaseStatus::Pending, now - Duration::days(1)),
            release("rejected", ReleaseStatus::Rejected, now - Duration::days(1)),
            release("future", ReleaseStatus::Approved, now + Duration::days(1)),
            release("due", ReleaseStatus::Approved, now - Duration::hours(1)),
        ];

        let view = merge_catalog(&base, &releases, &HashMap::new(), &BTreeSet::new(), now);
        let ids: Vec<_> = view.albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["dist_alb_due"]);
    }

    #[test]
    fn test_artist_index_includes_unpublished_requests() {
        let now = at("2024-05-10T12:00:00Z");
        let mut pending = release("pending", ReleaseStatus::Pending, now - Duration::days(1));
        pending.artist_name = "Waiting Room".to_string();
        pending.additional_main_artists = vec!["Feature Act".to_string()];

        let view = merge_catalog(
            &BaseCatalog::default(),
            &[pending],
            &HashMap::new(),
            &BTreeSet::new(),
            now,
        );
        assert!(view.albums.is_empty());
        assert_eq!(view.artist_index, vec!["Feature Act", "Waiting Room"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let now = at("2024-05-10T12:00:00Z");
        let base = BaseCatalog::seeded();
        let releases = vec![release("rel_1", ReleaseStatus::Live, now)];
        let mut plays = HashMap::new();
        plays.insert("t1".to_string(), 7);

        let first = merge_catalog(&base, &releases, &plays, &BTreeSet::new(), now);
        let second = merge_catalog(&base, &releases, &plays, &BTreeSet::new(), now);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.track("t1").unwrap().plays, 7);
    }

    #[test]
    fn test_existing_code_is_reused_in_place() {
        let now = at("2024-05-10T12:00:00Z");
        let base = BaseCatalog::seeded();
        let seed = base.tracks[0].clone();
        let mut req = release("rel_1", ReleaseStatus::Live, now);
        req.tracks[0].generated_hueq = None;
        req.tracks[0].existing_hueq = Some(seed.hueq.clone().unwrap().to_lowercase());
        req.tracks[0].genre = Some("Jazz Fusion".to_string());
        req.tracks[0].explicit = true;

        let view = merge_catalog(&base, &[req], &HashMap::new(), &BTreeSet::new(), now);

        assert_eq!(view.tracks.len(), 20);
        let reused = view.track(&seed.id).unwrap();
        assert_eq!(reused.genre, "Jazz Fusion");
        assert!(reused.explicit);
        assert_eq!(view.album("dist_alb_rel_1").unwrap().track_ids, vec![seed.id]);
    }

    #[test]
    fn test_malformed_request_does_not_abort_merge() {
        let now = at("2024-05-10T12:00:00Z");
        let mut empty = release("empty", ReleaseStatus::Live, now);
        empty.tracks.clear();
        let mut blank = release("", ReleaseStatus::Live, now);
        blank.id = "  ".to_string();
        let good = release("good", ReleaseStatus::Live, now);
        let duplicate = release("good", ReleaseStatus::Live, now);

        let view = merge_catalog(
            &BaseCatalog::default(),
            &[empty, blank, good, duplicate],
            &HashMap::new(),
            &BTreeSet::new(),
            now,
        );
        let ids: Vec<_> = view.albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["dist_alb_good"]);
        assert_eq!(view.tracks.len(), 1);
    }

    #[test]
    fn test_retired_tracks_are_hidden() {
        let base = BaseCatalog::seeded();
        let retired: BTreeSet<String> = ["t1".to_string()].into_iter().collect();
        let view = merge_catalog(&base, &[], &HashMap::new(), &retired, Utc::now());
        assert!(view.track("t1").is_none());
        assert!(view.albums.iter().all(|a| !a.track_ids.contains(&"t1".to_string())));
    }

    #[test]
    fn test_artist_stats() {
        let mut base = BaseCatalog::default();
        let mut make = |id: &str, artist: &str, plays: u64| {
            let mut t = BaseCatalog::seeded().tracks[0].clone();
            t.id = id.to_string();
            t.artist = artist.to_string();
            t.plays = plays;
            base.tracks.push(t);
        };
        make("x1", "Low", 100);
        make("x2", "High", 1_000);
        make("x3", "Low", 200);

        let view = merge_catalog(&base, &[], &HashMap::new(), &BTreeSet::new(), Utc::now());
        assert_eq!(
            artist_stats(&view, "High"),
            ArtistStats { monthly_plays: 450, global_rank: 1 }
        );
        assert_eq!(
            artist_stats(&view, "Low"),
            ArtistStats { monthly_plays: 135, global_rank: 2 }
        );
        assert_eq!(artist_stats(&view, "Nobody").global_rank, UNRANKED);
    }

    #[test]
    fn test_service_cache_refreshes_on_invalidation() {
        let store = memory_store();
        let release_repo = Arc::new(KvReleaseRepository::new(store.clone()));
        let play_repo = Arc::new(KvPlayCountRepository::new(store));
        let bus = Arc::new(EventBus::new());
        let service = Arc::new(CatalogService::new(
            Arc::new(BaseCatalog::seeded()),
            release_repo.clone(),
            play_repo,
            bus.clone(),
        ));
        service.register_event_handlers();

        assert_eq!(service.tracks().unwrap().len(), 20);

        let now = Utc::now();
        release_repo
            .save_releases(&[release("rel_1", ReleaseStatus::Live, now)])
            .unwrap();
        // cached until invalidated
        assert_eq!(service.tracks().unwrap().len(), 20);

        bus.emit(CatalogInvalidated::new("test"));
        assert_eq!(service.tracks().unwrap().len(), 21);
        assert!(service.track_by_hueq(" 123ab4 ").unwrap().is_some());
        let stats = service.artist_stats("New Artist").unwrap();
        assert_eq!(stats.monthly_plays, 0);
        assert_ne!(stats.global_rank, UNRANKED);
        assert_eq!(service.artist_stats("Nobody").unwrap().global_rank, UNRANKED);
    }
}
