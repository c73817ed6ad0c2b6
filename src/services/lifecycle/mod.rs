// src/services/lifecycle/mod.rs
//
// Release Lifecycle Engine
//
// Owns artist and moderator accounts, the current session, release requests
// and profile edit requests. Every mutation is written through to storage
// before the in-memory copy changes; events are emitted after the state
// lock is released.
//
// CRITICAL RULES:
// - Only this service mutates accounts and requests
// - APPROVED -> LIVE happens in `publish_due_releases_at`, never on demand
// - Resolutions are idempotent on repeat; conflicting ones are rejected

mod artist;
mod moderator;


use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::domain::{
    new_request_id, ArtistAccount, BaseCatalog, DomainError, HueqRegistry, IdKind,
    ModeratorAccount, ProfileEditRequest, ReleaseRequest,
};
use crate::error::{AppError, AppResult, AuthError};
use crate::events::{CatalogInvalidated, DataChanged, EventBus, SyncTopic};
use crate::repositories::{AccountRepository, ReleaseRepository};

/// Fresh ids colliding with stored ones are regenerated this many times
const MAX_ID_ATTEMPTS: usize = 8;

/// Who is acting in this session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Session {
    Artist { artist_id: String },
    Moderator { username: String },
}

/// Result of a verification or profile-edit decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Applied,
    /// The same decision was already recorded
    Unchanged,
}

/// Result of a release resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolveOutcome {
    /// `live` when the release date had already passed
    Approved { live: bool },
    Rejected,
    /// Deletion confirmed, request removed
    Retracted,
    /// Deletion refused, release kept
    DeletionDenied,
    Unchanged,
}

/// Result of an artist-initiated deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Public release, now awaiting moderator confirmation
    FlaggedForReview,
    AlreadyFlagged,
    Removed,
}

#[derive(Debug, Default)]
struct LifecycleState {
    artists: Vec<ArtistAccount>,
    moderator: Option<ModeratorAccount>,
    releases: Vec<ReleaseRequest>,
    profile_edits: Vec<ProfileEditRequest>,
    retired_tracks: BTreeSet<String>,
    session: Option<Session>,
}

impl LifecycleState {
    fn artist(&self, id: &str) -> Option<&ArtistAccount> {
        self.artists.iter().find(|a| a.id == id)
    }

    fn release_index(&self, id: &str) -> AppResult<usize> {
        self.releases
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::not_found("release request", id))
    }

    fn is_moderator(&self) -> bool {
        matches!(self.session, Some(Session::Moderator { .. }))
    }

    fn require_moderator(&self) -> AppResult<()> {
        match &self.session {
            Some(Session::Moderator { .. }) => Ok(()),
            Some(Session::Artist { .. }) => {
                Err(AuthError::WrongActor("moderator session required".to_string()).into())
            }
            None => Err(AuthError::NotLoggedIn.into()),
        }
    }

    fn require_artist(&self) -> AppResult<&ArtistAccount> {
        match &self.session {
            Some(Session::Artist { artist_id }) => self
                .artist(artist_id)
                .ok_or_else(|| AuthError::NotLoggedIn.into()),
            Some(Session::Moderator { .. }) => {
                Err(AuthError::WrongActor("artist session required".to_string()).into())
            }
            None => Err(AuthError::NotLoggedIn.into()),
        }
    }

    /// The owning artist or any moderator may act on a request
    fn require_owner_or_moderator(&self, request: &ReleaseRequest) -> AppResult<()> {
        if self.is_moderator() {
            return Ok(());
        }
        let artist = self.require_artist()?;
        if artist.id != request.artist_id {
            return Err(AuthError::WrongActor(format!(
                "release '{}' belongs to another artist",
                request.id
            ))
            .into());
        }
        Ok(())
    }

    /// Drop an artist session whose account no longer exists.
    /// Returns whether the session was invalidated.
    fn revalidate_session(&mut self) -> bool {
        let stale = match &self.session {
            Some(Session::Artist { artist_id }) => self.artist(artist_id).is_none(),
            _ => false,
        };
        if stale {
            self.session = None;
        }
        stale
    }
}

pub struct LifecycleService {
    account_repo: Arc<dyn AccountRepository>,
    release_repo: Arc<dyn ReleaseRepository>,
    base: Arc<BaseCatalog>,
    event_bus: Arc<EventBus>,
    state: Mutex<LifecycleState>,
}

impl LifecycleService {
    pub fn new(
        account_repo: Arc<dyn AccountRepository>,
        release_repo: Arc<dyn ReleaseRepository>,
        base: Arc<BaseCatalog>,
        event_bus: Arc<EventBus>,
    ) -> AppResult<Self> {
        let service = Self {
            account_repo,
            release_repo,
            base,
            event_bus,
            state: Mutex::new(LifecycleState::default()),
        };
        service.load_into_state()?;
        Ok(service)
    }

    fn state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_into_state(&self) -> AppResult<bool> {
        let artists = self.account_repo.list_artists()?;
        let moderator = self.account_repo.get_moderator()?;
        let releases = self.release_repo.list_releases()?;
        let profile_edits = self.release_repo.list_profile_edits()?;
        let retired_tracks = self.release_repo.list_retired_tracks()?;

        let mut st = self.state();
        st.artists = artists;
        st.moderator = moderator;
        st.releases = releases;
        st.profile_edits = profile_edits;
        st.retired_tracks = retired_tracks;
        Ok(st.revalidate_session())
    }

    /// Re-read shared storage after another session changed it.
    /// Returns whether the current session was invalidated.
    pub fn reload(&self, topic: SyncTopic) -> AppResult<bool> {
        match topic {
            SyncTopic::TracksChanged | SyncTopic::ArtistDataChanged => {}
            SyncTopic::PlaylistsChanged | SyncTopic::SettingsChanged => {
                log::debug!("[LIFECYCLE] Ignoring sync topic {:?}", topic);
                return Ok(false);
            }
        }

        let invalidated = self.load_into_state()?;
        if invalidated {
            log::info!("[LIFECYCLE] Session ended: artist account no longer exists");
        }
        self.event_bus
            .emit(CatalogInvalidated::new(format!("sync {:?}", topic)));
        Ok(invalidated)
    }

    // ========================================================================
    // SESSION
    // ========================================================================

    pub fn current_session(&self) -> Option<Session> {
        self.state().session.clone()
    }

    pub fn current_artist(&self) -> Option<ArtistAccount> {
        self.state().require_artist().ok().cloned()
    }

    pub fn logout(&self) {
        let previous = self.state().session.take();
        if previous.is_some() {
            log::info!("[LIFECYCLE] Logged out");
        }
    }

    // ========================================================================
    // WRITE-THROUGH HELPERS
    // ========================================================================

    fn commit_artists(&self, st: &mut LifecycleState, artists: Vec<ArtistAccount>) -> AppResult<()> {
        self.account_repo.save_artists(&artists)?;
        st.artists = artists;
        Ok(())
    }

    fn commit_moderator(&self, st: &mut LifecycleState, moderator: ModeratorAccount) -> AppResult<()> {
        self.account_repo.save_moderator(Some(&moderator))?;
        st.moderator = Some(moderator);
        Ok(())
    }

    fn commit_releases(
        &self,
        st: &mut LifecycleState,
        releases: Vec<ReleaseRequest>,
    ) -> AppResult<()> {
        self.release_repo.save_releases(&releases)?;
        st.releases = releases;
        Ok(())
    }

    fn commit_profile_edits(
        &self,
        st: &mut LifecycleState,
        edits: Vec<ProfileEditRequest>,
    ) -> AppResult<()> {
        self.release_repo.save_profile_edits(&edits)?;
        st.profile_edits = edits;
        Ok(())
    }

    fn commit_retired(&self, st: &mut LifecycleState, retired: BTreeSet<String>) -> AppResult<()> {
        self.release_repo.save_retired_tracks(&retired)?;
        st.retired_tracks = retired;
        Ok(())
    }

    // ========================================================================
    // IDENTIFIERS
    // ========================================================================

    /// A new id of `kind` that no stored entity uses yet
    fn unique_id<F>(kind: IdKind, taken: F) -> AppResult<String>
    where
        F: Fn(&str) -> bool,
    {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = new_request_id(kind);
            if !taken(&id) {
                return Ok(id);
            }
            log::warn!("[LIFECYCLE] Generated id {} already in use, retrying", id);
        }
        Err(DomainError::InvariantViolation(format!(
            "Could not generate a unique {} id",
            kind.prefix()
        ))
        .into())
    }

    /// Every code in use: base catalog plus all requests
    fn code_registry(&self, st: &LifecycleState) -> HueqRegistry {
        let seed_codes = self.base.tracks.iter().filter_map(|t| t.hueq.as_deref());
        let request_codes = st.releases.iter().flat_map(|r| r.catalog_codes());
        HueqRegistry::new(seed_codes.chain(request_codes))
    }

    fn announce(&self, topic: SyncTopic) {
        self.event_bus.emit(DataChanged::new(topic));
    }
}
