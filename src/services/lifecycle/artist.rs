// src/services/lifecycle/artist.rs
//
// Artist-facing operations of the lifecycle engine.

use std::collections::HashSet;

use chrono::Utc;

use super::{DeleteOutcome, LifecycleService, Session};
use crate::domain::account::{ensure_username_available, ArtistStatus};
use crate::domain::{
    validate_artist_account, validate_release_request, ArtistAccount, DomainError, IdKind,
    ProfileEdit, ProfileEditRequest, ReleaseDraft, ReleasePatch, ReleaseRequest, ReleaseStatus,
};
use crate::error::{AppError, AppResult, AuthError};
use crate::events::{
    CatalogInvalidated, ReleaseRemoved, ReleaseSubmitted, ReleaseUpdated, SyncTopic,
};

/// Label used when neither the draft nor the artist provides one
const FALLBACK_LABEL: &str = "Independent";

impl LifecycleService {
    // ========================================================================
    // ACCOUNTS
    // ========================================================================

    /// Create a PENDING account. Does not log in.
    pub fn register_artist(
        &self,
        artist_name: &str,
        username: &str,
        password: &str,
    ) -> AppResult<ArtistAccount> {
        let account = {
            let mut st = self.state();
            ensure_username_available(&st.artists, username)?;

            let id = Self::unique_id(IdKind::Artist, |id| st.artist(id).is_some())?;
            let account = ArtistAccount::new(
                id,
                artist_name.trim().to_string(),
                username.to_string(),
                password.to_string(),
            );
            validate_artist_account(&account)?;

            let mut artists = st.artists.clone();
            artists.push(account.clone());
            self.commit_artists(&mut st, artists)?;
            account
        };

        log::info!(
            "[LIFECYCLE] Artist '{}' registered as {}",
            account.artist_name,
            account.id
        );
        self.announce(SyncTopic::ArtistDataChanged);
        Ok(account)
    }

    /// Start an artist session, replacing any current session
    pub fn login_artist(&self, username: &str, password: &str) -> AppResult<ArtistAccount> {
        let mut st = self.state();
        let account = st
            .artists
            .iter()
            .find(|a| a.credentials_match(username, password))
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        match account.status {
            ArtistStatus::Pending => return Err(AuthError::AccountPending.into()),
            ArtistStatus::Rejected => return Err(AuthError::AccountRejected.into()),
            ArtistStatus::Approved => {}
        }

        st.session = Some(Session::Artist {
            artist_id: account.id.clone(),
        });
        log::info!("[LIFECYCLE] Artist {} logged in", account.id);
        Ok(account)
    }

    /// Artists may change their own password; moderators any artist's
    pub fn change_artist_password(&self, artist_id: &str, new_password: &str) -> AppResult<()> {
        if new_password.is_empty() {
            return Err(DomainError::InvariantViolation("Password cannot be empty".to_string()).into());
        }
        {
            let mut st = self.state();
            if !st.is_moderator() && st.require_artist()?.id != artist_id {
                return Err(AuthError::WrongActor(
                    "cannot change another artist's password".to_string(),
                )
                .into());
            }

            let mut artists = st.artists.clone();
            let account = artists
                .iter_mut()
                .find(|a| a.id == artist_id)
                .ok_or_else(|| AppError::not_found("artist", artist_id))?;
            account.password = new_password.to_string();
            self.commit_artists(&mut st, artists)?;
        }

        log::info!("[LIFECYCLE] Password changed for artist {}", artist_id);
        self.announce(SyncTopic::ArtistDataChanged);
        Ok(())
    }

    // ========================================================================
    // RELEASES
    // ========================================================================

    /// Requests of the logged-in artist, newest submission first
    pub fn my_releases(&self) -> AppResult<Vec<ReleaseRequest>> {
        let st = self.state();
        let artist = st.require_artist()?;
        let mut releases: Vec<ReleaseRequest> = st
            .releases
            .iter()
            .filter(|r| r.artist_id == artist.id)
            .cloned()
            .collect();
        releases.sort_by(|a, b| b.submission_time.cmp(&a.submission_time));
        Ok(releases)
    }

    /// Store a PENDING request for the logged-in artist.
    /// Field completeness is not checked here.
    pub fn submit_release(&self, draft: ReleaseDraft) -> AppResult<ReleaseRequest> {
        let artist = self.state().require_artist()?.clone();
        self.store_submission(draft, artist.id, artist.artist_name)
    }

    pub(super) fn store_submission(
        &self,
        mut draft: ReleaseDraft,
        artist_id: String,
        artist_name: String,
    ) -> AppResult<ReleaseRequest> {
        if draft.label.trim().is_empty() {
            draft.label = if artist_name.trim().is_empty() {
                FALLBACK_LABEL.to_string()
            } else {
                artist_name.clone()
            };
        }
        for track in &mut draft.tracks {
            // codes are only ever issued on approval
            track.generated_hueq = None;
        }

        let request = {
            let mut st = self.state();
            let id = Self::unique_id(IdKind::Release, |id| {
                st.releases.iter().any(|r| r.id == id)
            })?;
            let request = ReleaseRequest::submit(id, artist_id, artist_name, draft, Utc::now());
            validate_release_request(&request)?;

            let mut releases = st.releases.clone();
            releases.push(request.clone());
            self.commit_releases(&mut st, releases)?;
            request
        };

        log::info!(
            "[LIFECYCLE] Release '{}' submitted as {} by {}",
            request.title,
            request.id,
            request.artist_name
        );
        self.event_bus.emit(ReleaseSubmitted::new(
            request.id.clone(),
            request.artist_id.clone(),
        ));
        self.announce(SyncTopic::TracksChanged);
        Ok(request)
    }

    /// Replace fields of an existing request, whatever its status.
    ///
    /// Approved and live requests keep their codes; tracks added by the edit
    /// get fresh ones so the request never goes live with an uncoded track.
    pub fn update_release_request(
        &self,
        id: &str,
        patch: ReleasePatch,
    ) -> AppResult<ReleaseRequest> {
        let updated = {
            let mut st = self.state();
            let idx = st.release_index(id)?;
            st.require_owner_or_moderator(&st.releases[idx])?;
            let is_moderator = st.is_moderator();

            let mut releases = st.releases.clone();
            let request = &mut releases[idx];
            let is_public =
                matches!(request.status, ReleaseStatus::Approved | ReleaseStatus::Live);
            // only codes this request was issued may survive an edit, each once
            let mut issued: HashSet<String> = if is_public {
                request
                    .tracks
                    .iter()
                    .filter_map(|t| t.generated_hueq.clone())
                    .collect()
            } else {
                HashSet::new()
            };
            request.apply_patch(patch, is_moderator);
            for track in &mut request.tracks {
                let keep = track.existing_reference().is_none()
                    && track
                        .generated_hueq
                        .as_ref()
                        .is_some_and(|code| issued.remove(code));
                if !keep {
                    track.generated_hueq = None;
                }
            }
            if is_public {
                // registry built before the edit still knows every code kept by it
                let mut registry = self.code_registry(&st);
                let assigned = request.assign_missing_codes(|| registry.issue())?;
                if assigned > 0 {
                    log::info!(
                        "[LIFECYCLE] Assigned {} new codes to edited release {}",
                        assigned,
                        request.id
                    );
                }
            }
            validate_release_request(request)?;

            let updated = request.clone();
            self.commit_releases(&mut st, releases)?;
            updated
        };

        let visible = matches!(updated.status, ReleaseStatus::Approved | ReleaseStatus::Live);
        self.event_bus
            .emit(ReleaseUpdated::new(updated.id.clone(), visible));
        if visible {
            self.event_bus
                .emit(CatalogInvalidated::new(format!("release {} edited", updated.id)));
        }
        self.announce(SyncTopic::TracksChanged);
        Ok(updated)
    }

    /// Public releases are flagged for moderator review; anything else is
    /// removed outright.
    pub fn delete_release(&self, id: &str) -> AppResult<DeleteOutcome> {
        let (outcome, removed) = {
            let mut st = self.state();
            let idx = st.release_index(id)?;
            st.require_owner_or_moderator(&st.releases[idx])?;

            let mut releases = st.releases.clone();
            if releases[idx].requires_deletion_review() {
                if releases[idx].deletion_requested {
                    return Ok(DeleteOutcome::AlreadyFlagged);
                }
                releases[idx].flag_for_deletion()?;
                self.commit_releases(&mut st, releases)?;
                (DeleteOutcome::FlaggedForReview, None)
            } else {
                let removed = releases.remove(idx);
                self.commit_releases(&mut st, releases)?;
                (DeleteOutcome::Removed, Some(removed))
            }
        };

        match &removed {
            Some(request) => {
                log::info!("[LIFECYCLE] Release {} withdrawn", request.id);
                self.event_bus.emit(ReleaseRemoved::new(
                    request.id.clone(),
                    request.owned_track_ids(),
                ));
                self.event_bus
                    .emit(CatalogInvalidated::new(format!("release {} withdrawn", request.id)));
            }
            None => log::info!("[LIFECYCLE] Release {} flagged for deletion", id),
        }
        self.announce(SyncTopic::TracksChanged);
        Ok(outcome)
    }

    // ========================================================================
    // PROFILE EDITS
    // ========================================================================

    pub fn submit_profile_edit(&self, edit: ProfileEdit) -> AppResult<ProfileEditRequest> {
        let request = {
            let mut st = self.state();
            let artist = st.require_artist()?.clone();
            let id = Self::unique_id(IdKind::ProfileEdit, |id| {
                st.profile_edits.iter().any(|e| e.id == id)
            })?;
            let request = ProfileEditRequest::new(id, &artist, edit);

            let mut edits = st.profile_edits.clone();
            edits.push(request.clone());
            self.commit_profile_edits(&mut st, edits)?;
            request
        };

        log::info!(
            "[LIFECYCLE] Profile edit {} submitted by {}",
            request.id,
            request.artist_id
        );
        self.announce(SyncTopic::ArtistDataChanged);
        Ok(request)
    }
}
