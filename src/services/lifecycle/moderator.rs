// src/services/lifecycle/moderator.rs
//
// Moderator-facing operations of the lifecycle engine.

use chrono::{DateTime, Utc};

use super::{DecisionOutcome, LifecycleService, ResolveOutcome, Session};
use crate::domain::account::validate_artist_decision;
use crate::domain::{
    validate_release_request, ArtistAccount, ArtistStatus, DomainError, IdKind, ModeratorAccount,
    ProfileEditRequest, ProfileEditStatus, ReleaseDecision, ReleaseDraft, ReleaseRequest,
    ReleaseStatus, ResolutionContext, ResolveRelease,
};
use crate::error::{AppError, AppResult, AuthError};
use crate::events::{
    ArtistAccountRemoved, CatalogInvalidated, ProfileEditResolved, ReleaseRemoved,
    ReleaseResolved, ReleasesPublished, SyncTopic, TrackRetired,
};

/// Identity used for moderator uploads without an explicit artist
pub const VARIOUS_ARTISTS: &str = "Various Artists";

impl LifecycleService {
    // ========================================================================
    // MODERATOR ACCOUNT
    // ========================================================================

    /// Only one moderator may ever be registered per deployment
    pub fn register_moderator(&self, username: &str, password: &str) -> AppResult<()> {
        if username.is_empty() {
            return Err(
                DomainError::InvariantViolation("Moderator username cannot be empty".to_string())
                    .into(),
            );
        }
        {
            let mut st = self.state();
            if st.moderator.is_some() {
                return Err(DomainError::ModeratorExists.into());
            }
            self.commit_moderator(
                &mut st,
                ModeratorAccount {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            )?;
        }

        log::info!("[LIFECYCLE] Moderator '{}' registered", username);
        self.announce(SyncTopic::ArtistDataChanged);
        Ok(())
    }

    /// Start a moderator session, replacing any current session
    pub fn login_moderator(&self, username: &str, password: &str) -> AppResult<()> {
        let mut st = self.state();
        let matches = st
            .moderator
            .as_ref()
            .is_some_and(|m| m.credentials_match(username, password));
        if !matches {
            return Err(AuthError::InvalidCredentials.into());
        }
        st.session = Some(Session::Moderator {
            username: username.to_string(),
        });
        log::info!("[LIFECYCLE] Moderator '{}' logged in", username);
        Ok(())
    }

    pub fn change_moderator_password(&self, new_password: &str) -> AppResult<()> {
        if new_password.is_empty() {
            return Err(DomainError::InvariantViolation("Password cannot be empty".to_string()).into());
        }
        {
            let mut st = self.state();
            st.require_moderator()?;
            let mut moderator = st
                .moderator
                .clone()
                .ok_or_else(|| AppError::not_found("moderator", "account"))?;
            moderator.password = new_password.to_string();
            self.commit_moderator(&mut st, moderator)?;
        }

        log::info!("[LIFECYCLE] Moderator password changed");
        self.announce(SyncTopic::ArtistDataChanged);
        Ok(())
    }

    // ========================================================================
    // ARTIST VERIFICATION
    // ========================================================================

    pub fn approve_artist(&self, artist_id: &str) -> AppResult<DecisionOutcome> {
        self.decide_artist(artist_id, ArtistStatus::Approved)
    }

    pub fn reject_artist(&self, artist_id: &str) -> AppResult<DecisionOutcome> {
        self.decide_artist(artist_id, ArtistStatus::Rejected)
    }

    fn decide_artist(&self, artist_id: &str, target: ArtistStatus) -> AppResult<DecisionOutcome> {
        {
            let mut st = self.state();
            st.require_moderator()?;

            let mut artists = st.artists.clone();
            let account = artists
                .iter_mut()
                .find(|a| a.id == artist_id)
                .ok_or_else(|| AppError::not_found("artist", artist_id))?;
            validate_artist_decision(account.status, target)?;
            if account.status == target {
                return Ok(DecisionOutcome::Unchanged);
            }
            account.status = target;
            self.commit_artists(&mut st, artists)?;
        }

        log::info!("[LIFECYCLE] Artist {} is now {}", artist_id, target);
        self.announce(SyncTopic::ArtistDataChanged);
        Ok(DecisionOutcome::Applied)
    }

    /// Hard-delete an account. Pending profile edits of the artist go with it;
    /// release requests keep their denormalized artist name.
    pub fn delete_artist_account(&self, artist_id: &str) -> AppResult<()> {
        {
            let mut st = self.state();
            st.require_moderator()?;
            if st.artist(artist_id).is_none() {
                return Err(AppError::not_found("artist", artist_id));
            }

            let artists: Vec<ArtistAccount> = st
                .artists
                .iter()
                .filter(|a| a.id != artist_id)
                .cloned()
                .collect();
            let edits: Vec<ProfileEditRequest> = st
                .profile_edits
                .iter()
                .filter(|e| !(e.artist_id == artist_id && e.is_pending()))
                .cloned()
                .collect();
            self.commit_artists(&mut st, artists)?;
            if edits.len() != st.profile_edits.len() {
                self.commit_profile_edits(&mut st, edits)?;
            }
            st.revalidate_session();
        }

        log::info!("[LIFECYCLE] Artist account {} deleted", artist_id);
        self.event_bus
            .emit(ArtistAccountRemoved::new(artist_id.to_string()));
        self.announce(SyncTopic::ArtistDataChanged);
        Ok(())
    }

    // ========================================================================
    // QUEUES
    // ========================================================================

    pub fn all_artists(&self) -> AppResult<Vec<ArtistAccount>> {
        let st = self.state();
        st.require_moderator()?;
        Ok(st.artists.clone())
    }

    pub fn pending_artists(&self) -> AppResult<Vec<ArtistAccount>> {
        let st = self.state();
        st.require_moderator()?;
        Ok(st
            .artists
            .iter()
            .filter(|a| a.status == ArtistStatus::Pending)
            .cloned()
            .collect())
    }

    pub fn all_releases(&self) -> AppResult<Vec<ReleaseRequest>> {
        let st = self.state();
        st.require_moderator()?;
        Ok(st.releases.clone())
    }

    /// New submissions and deletion requests awaiting a decision
    pub fn pending_releases(&self) -> AppResult<Vec<ReleaseRequest>> {
        let st = self.state();
        st.require_moderator()?;
        Ok(st
            .releases
            .iter()
            .filter(|r| r.status == ReleaseStatus::Pending || r.deletion_requested)
            .cloned()
            .collect())
    }

    pub fn pending_profile_edits(&self) -> AppResult<Vec<ProfileEditRequest>> {
        let st = self.state();
        st.require_moderator()?;
        Ok(st
            .profile_edits
            .iter()
            .filter(|e| e.is_pending())
            .cloned()
            .collect())
    }

    // ========================================================================
    // RELEASES
    // ========================================================================

    /// Upload on behalf of an artist without an account, or a compilation
    pub fn submit_release_as_moderator(
        &self,
        draft: ReleaseDraft,
        artist_name: Option<String>,
    ) -> AppResult<ReleaseRequest> {
        let artist_id = {
            let st = self.state();
            st.require_moderator()?;
            Self::unique_id(IdKind::VariousArtists, |id| {
                st.releases.iter().any(|r| r.artist_id == id)
            })?
        };
        let artist_name = artist_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| VARIOUS_ARTISTS.to_string());
        self.store_submission(draft, artist_id, artist_name)
    }

    pub fn approve_release(&self, id: &str) -> AppResult<ResolveOutcome> {
        self.decide_release(id, ReleaseDecision::Approve, Utc::now())
    }

    pub fn reject_release(&self, id: &str) -> AppResult<ResolveOutcome> {
        self.decide_release(id, ReleaseDecision::Reject, Utc::now())
    }

    /// Resolve with the context the request is currently in
    pub fn decide_release(
        &self,
        id: &str,
        decision: ReleaseDecision,
        now: DateTime<Utc>,
    ) -> AppResult<ResolveOutcome> {
        let command = {
            let st = self.state();
            let idx = st.release_index(id)?;
            ResolveRelease::for_request(&st.releases[idx], decision)
        };
        self.resolve_release_at(command, now)
    }

    pub fn resolve_release(&self, command: ResolveRelease) -> AppResult<ResolveOutcome> {
        self.resolve_release_at(command, Utc::now())
    }

    /// Apply a moderator resolution.
    ///
    /// A command issued against a context the request has already left is
    /// answered from the recorded outcome: the same decision is `Unchanged`,
    /// a contrary one is a state conflict.
    pub fn resolve_release_at(
        &self,
        command: ResolveRelease,
        now: DateTime<Utc>,
    ) -> AppResult<ResolveOutcome> {
        let (outcome, removed) = {
            let mut st = self.state();
            st.require_moderator()?;
            let idx = st.release_index(&command.id)?;
            let mut releases = st.releases.clone();
            let current = ResolveRelease::for_request(&releases[idx], command.decision).context;

            let (outcome, removed) = match (command.context, current, command.decision) {
                // deletion already refused
                (ResolutionContext::DeletionRequest, ResolutionContext::NewSubmission, decision) => {
                    // only public requests can ever have been flagged
                    let was_public = matches!(
                        releases[idx].status,
                        ReleaseStatus::Approved | ReleaseStatus::Live
                    );
                    match decision {
                        ReleaseDecision::Reject if was_public => (ResolveOutcome::Unchanged, None),
                        ReleaseDecision::Reject => {
                            return Err(DomainError::InvalidStateTransition(format!(
                                "release '{}' has no deletion request",
                                command.id
                            ))
                            .into())
                        }
                        ReleaseDecision::Approve => {
                            return Err(DomainError::InvalidStateTransition(format!(
                                "deletion of release '{}' was already refused",
                                command.id
                            ))
                            .into())
                        }
                    }
                }
                // the submission was approved long ago, it is now up for deletion
                (ResolutionContext::NewSubmission, ResolutionContext::DeletionRequest, decision) => {
                    match decision {
                        ReleaseDecision::Approve => (ResolveOutcome::Unchanged, None),
                        ReleaseDecision::Reject => {
                            return Err(DomainError::InvalidStateTransition(format!(
                                "release '{}' was already approved",
                                command.id
                            ))
                            .into())
                        }
                    }
                }
                (ResolutionContext::DeletionRequest, _, ReleaseDecision::Approve) => {
                    let request = releases.remove(idx);
                    (ResolveOutcome::Retracted, Some(request))
                }
                (ResolutionContext::DeletionRequest, _, ReleaseDecision::Reject) => {
                    releases[idx].clear_deletion_flag();
                    (ResolveOutcome::DeletionDenied, None)
                }
                (ResolutionContext::NewSubmission, _, ReleaseDecision::Approve) => {
                    let request = &mut releases[idx];
                    match request.status {
                        ReleaseStatus::Approved | ReleaseStatus::Live => {
                            (ResolveOutcome::Unchanged, None)
                        }
                        _ => {
                            let mut registry = self.code_registry(&st);
                            request.assign_missing_codes(|| registry.issue())?;
                            request.mark_approved()?;
                            let live = request.publish_if_due(now)?;
                            validate_release_request(request)?;
                            (ResolveOutcome::Approved { live }, None)
                        }
                    }
                }
                (ResolutionContext::NewSubmission, _, ReleaseDecision::Reject) => {
                    let request = &mut releases[idx];
                    if request.status == ReleaseStatus::Rejected {
                        (ResolveOutcome::Unchanged, None)
                    } else {
                        request.mark_rejected()?;
                        (ResolveOutcome::Rejected, None)
                    }
                }
            };

            if outcome == ResolveOutcome::Unchanged {
                return Ok(outcome);
            }
            self.commit_releases(&mut st, releases)?;
            (outcome, removed)
        };

        log::info!(
            "[LIFECYCLE] Release {} resolved: {:?}",
            command.id,
            outcome
        );
        self.event_bus.emit(ReleaseResolved::new(
            command.id.clone(),
            command.decision,
            command.context,
        ));
        if let Some(request) = removed {
            self.event_bus
                .emit(ReleaseRemoved::new(request.id.clone(), request.owned_track_ids()));
        }
        if matches!(
            outcome,
            ResolveOutcome::Retracted | ResolveOutcome::Approved { live: true }
        ) {
            self.event_bus
                .emit(CatalogInvalidated::new(format!("release {} resolved", command.id)));
        }
        self.announce(SyncTopic::TracksChanged);
        Ok(outcome)
    }

    /// Promote every APPROVED request whose date has passed to LIVE.
    /// Runs without a session; the scheduler drives it.
    pub fn publish_due_releases_at(&self, now: DateTime<Utc>) -> AppResult<Vec<String>> {
        let published = {
            let mut st = self.state();
            let mut releases = st.releases.clone();
            let mut published = Vec::new();
            for request in &mut releases {
                if request.publish_if_due(now)? {
                    published.push(request.id.clone());
                }
            }
            if published.is_empty() {
                return Ok(published);
            }
            self.commit_releases(&mut st, releases)?;
            published
        };

        log::info!("[LIFECYCLE] Published {} releases", published.len());
        self.event_bus
            .emit(ReleasesPublished::new(published.clone()));
        self.event_bus.emit(CatalogInvalidated::new("releases published"));
        self.announce(SyncTopic::TracksChanged);
        Ok(published)
    }

    pub fn publish_due_releases(&self) -> AppResult<Vec<String>> {
        self.publish_due_releases_at(Utc::now())
    }

    /// Take a base-catalog track out of the effective catalog
    pub fn retire_base_track(&self, track_id: &str) -> AppResult<DecisionOutcome> {
        {
            let mut st = self.state();
            st.require_moderator()?;
            if !self.base.tracks.iter().any(|t| t.id == track_id) {
                return Err(AppError::not_found("base track", track_id));
            }
            if st.retired_tracks.contains(track_id) {
                return Ok(DecisionOutcome::Unchanged);
            }
            let mut retired = st.retired_tracks.clone();
            retired.insert(track_id.to_string());
            self.commit_retired(&mut st, retired)?;
        }

        log::info!("[LIFECYCLE] Base track {} retired", track_id);
        self.event_bus.emit(TrackRetired::new(track_id.to_string()));
        self.event_bus
            .emit(CatalogInvalidated::new(format!("track {} retired", track_id)));
        self.announce(SyncTopic::TracksChanged);
        Ok(DecisionOutcome::Applied)
    }

    // ========================================================================
    // PROFILE EDITS
    // ========================================================================

    pub fn approve_profile_edit(&self, id: &str) -> AppResult<DecisionOutcome> {
        self.decide_profile_edit(id, ProfileEditStatus::Approved)
    }

    pub fn reject_profile_edit(&self, id: &str) -> AppResult<DecisionOutcome> {
        self.decide_profile_edit(id, ProfileEditStatus::Rejected)
    }

    fn decide_profile_edit(
        &self,
        id: &str,
        target: ProfileEditStatus,
    ) -> AppResult<DecisionOutcome> {
        let artist_id = {
            let mut st = self.state();
            st.require_moderator()?;

            let mut edits = st.profile_edits.clone();
            let edit = edits
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| AppError::not_found("profile edit", id))?;
            if !edit.resolve(target)? {
                return Ok(DecisionOutcome::Unchanged);
            }
            let edit = edit.clone();

            if target == ProfileEditStatus::Approved {
                let mut artists = st.artists.clone();
                let applied = match artists.iter_mut().find(|a| a.id == edit.artist_id) {
                    Some(account) => {
                        edit.apply_to(account);
                        true
                    }
                    None => false,
                };
                if applied {
                    self.commit_artists(&mut st, artists)?;
                } else {
                    log::warn!(
                        "[LIFECYCLE] Profile edit {} approved for missing artist {}",
                        edit.id,
                        edit.artist_id
                    );
                }
            }
            self.commit_profile_edits(&mut st, edits)?;
            edit.artist_id
        };

        log::info!("[LIFECYCLE] Profile edit {} resolved as {:?}", id, target);
        self.event_bus.emit(ProfileEditResolved::new(
            id.to_string(),
            artist_id,
            target == ProfileEditStatus::Approved,
        ));
        self.announce(SyncTopic::ArtistDataChanged);
        Ok(DecisionOutcome::Applied)
    }
}
