use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::invariants::validate_release_transition;
use crate::domain::DomainResult;

/// Prefix of album ids materialized from a release request
pub const RELEASE_ALBUM_PREFIX: &str = "dist_alb_";

/// Prefix of track ids materialized from a release request
pub const RELEASE_TRACK_PREFIX: &str = "dist_trk_";

/// Moderation status of a release request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseStatus {
    Pending,
    Approved,
    Rejected,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseType {
    Single,
    #[serde(rename = "EP")]
    Ep,
    Album,
    Mixtape,
}

/// A track draft embedded in a release request.
/// It only gets a catalog identity once the release is merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionTrack {
    pub title: String,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feat: Option<String>,
    #[serde(default)]
    pub main_artists: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default)]
    pub file_url: String,
    #[serde(default)]
    pub duration: f64,
    /// Reference to a track already in the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_hueq: Option<String>,
    /// Assigned on approval, only when `existing_hueq` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_hueq: Option<String>,
    /// Moderator-only override for compilations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

impl DistributionTrack {
    pub fn new(title: impl Into<String>, file_url: impl Into<String>, duration: f64) -> Self {
        Self {
            title: title.into(),
            explicit: false,
            feat: None,
            main_artists: Vec::new(),
            genre: None,
            file_url: file_url.into(),
            duration,
            existing_hueq: None,
            generated_hueq: None,
            artist: None,
        }
    }

    /// Reference to a pre-existing catalog track, ignoring blank input
    pub fn existing_reference(&self) -> Option<&str> {
        self.existing_hueq
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    pub fn needs_generated_code(&self) -> bool {
        self.existing_reference().is_none() && self.generated_hueq.is_none()
    }
}

/// Artist-provided content of a release, as accepted on submission.
/// Field completeness is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDraft {
    pub title: String,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub covers: Vec<String>,
    #[serde(default)]
    pub additional_main_artists: Vec<String>,
    #[serde(default)]
    pub tracks: Vec<DistributionTrack>,
    pub release_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_message: Option<String>,
}

/// Field replacements for an existing request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub release_type: Option<ReleaseType>,
    pub genre: Option<String>,
    pub label: Option<String>,
    pub covers: Option<Vec<String>>,
    pub additional_main_artists: Option<Vec<String>>,
    pub tracks: Option<Vec<DistributionTrack>>,
    pub release_date: Option<DateTime<Utc>>,
    pub release_message: Option<String>,
    /// Only honoured for moderator sessions
    pub artist_name: Option<String>,
}

/// The central workflow entity of the artist hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRequest {
    pub id: String,
    pub artist_id: String,
    /// Denormalized at submission; later artist renames are not tracked
    pub artist_name: String,
    pub status: ReleaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deletion_requested: bool,
    pub title: String,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub covers: Vec<String>,
    #[serde(default)]
    pub additional_main_artists: Vec<String>,
    #[serde(default)]
    pub tracks: Vec<DistributionTrack>,
    pub release_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_message: Option<String>,
}

impl ReleaseRequest {
    /// Build a PENDING request from a draft
    pub fn submit(
        id: String,
        artist_id: String,
        artist_name: String,
        draft: ReleaseDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            artist_id,
            artist_name,
            status: ReleaseStatus::Pending,
            submission_time: Some(now),
            deletion_requested: false,
            title: draft.title,
            release_type: draft.release_type,
            genre: draft.genre,
            label: draft.label,
            covers: draft.covers,
            additional_main_artists: draft.additional_main_artists,
            tracks: draft.tracks,
            release_date: draft.release_date,
            release_message: draft.release_message,
        }
    }

    /// LIVE, or APPROVED with a release date that has passed
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            ReleaseStatus::Live => true,
            ReleaseStatus::Approved => self.release_date <= now,
            _ => false,
        }
    }

    /// Whether deletion goes through moderator confirmation instead of
    /// removing the request outright
    pub fn requires_deletion_review(&self) -> bool {
        matches!(self.status, ReleaseStatus::Live | ReleaseStatus::Approved)
    }

    pub fn album_id(&self) -> String {
        format!("{}{}", RELEASE_ALBUM_PREFIX, self.id)
    }

    pub fn track_id(&self, index: usize) -> String {
        format!("{}{}_{}", RELEASE_TRACK_PREFIX, self.id, index)
    }

    /// Every catalog id this release could have materialized.
    /// Tracks merged by reference keep their original id and are never listed.
    pub fn owned_track_ids(&self) -> Vec<String> {
        (0..self.tracks.len()).map(|idx| self.track_id(idx)).collect()
    }

    /// Every catalog code this request references or carries
    pub fn catalog_codes(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().flat_map(|t| {
            t.existing_reference()
                .into_iter()
                .chain(t.generated_hueq.as_deref())
        })
    }

    /// Give every track without an existing reference a code.
    /// Tracks that already carry one keep it.
    pub fn assign_missing_codes<F>(&mut self, mut issue: F) -> DomainResult<usize>
    where
        F: FnMut() -> DomainResult<String>,
    {
        let mut assigned = 0;
        for track in self.tracks.iter_mut().filter(|t| t.needs_generated_code()) {
            track.generated_hueq = Some(issue()?);
            assigned += 1;
        }
        Ok(assigned)
    }

    pub fn mark_approved(&mut self) -> DomainResult<()> {
        validate_release_transition(self.status, ReleaseStatus::Approved)?;
        self.status = ReleaseStatus::Approved;
        Ok(())
    }

    pub fn mark_rejected(&mut self) -> DomainResult<()> {
        validate_release_transition(self.status, ReleaseStatus::Rejected)?;
        self.status = ReleaseStatus::Rejected;
        self.deletion_requested = false;
        Ok(())
    }

    /// APPROVED -> LIVE once the release date has passed.
    /// Returns whether the request was promoted.
    pub fn publish_if_due(&mut self, now: DateTime<Utc>) -> DomainResult<bool> {
        if self.status != ReleaseStatus::Approved || self.release_date > now {
            return Ok(false);
        }
        validate_release_transition(self.status, ReleaseStatus::Live)?;
        self.status = ReleaseStatus::Live;
        Ok(true)
    }

    pub fn flag_for_deletion(&mut self) -> DomainResult<()> {
        if !self.requires_deletion_review() {
            return Err(crate::domain::DomainError::InvalidStateTransition(format!(
                "cannot flag {} release '{}' for deletion",
                self.status, self.id
            )));
        }
        self.deletion_requested = true;
        Ok(())
    }

    pub fn clear_deletion_flag(&mut self) {
        self.deletion_requested = false;
    }

    /// Replace the fields present in the patch; status is never touched
    pub fn apply_patch(&mut self, patch: ReleasePatch, allow_artist_rename: bool) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(release_type) = patch.release_type {
            self.release_type = release_type;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(covers) = patch.covers {
            self.covers = covers;
        }
        if let Some(artists) = patch.additional_main_artists {
            self.additional_main_artists = artists;
        }
        if let Some(tracks) = patch.tracks {
            self.tracks = tracks;
        }
        if let Some(date) = patch.release_date {
            self.release_date = date;
        }
        if let Some(message) = patch.release_message {
            self.release_message = Some(message);
        }
        if allow_artist_rename {
            if let Some(name) = patch.artist_name {
                self.artist_name = name;
            }
        }
    }
}

/// What the moderator decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseDecision {
    Approve,
    Reject,
}

/// What the decision applies to, derived from `deletion_requested`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionContext {
    NewSubmission,
    DeletionRequest,
}

/// A moderator resolution of a release request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRelease {
    pub id: String,
    pub decision: ReleaseDecision,
    pub context: ResolutionContext,
}

impl ResolveRelease {
    pub fn for_request(request: &ReleaseRequest, decision: ReleaseDecision) -> Self {
        let context = if request.deletion_requested {
            ResolutionContext::DeletionRequest
        } else {
            ResolutionContext::NewSubmission
        };
        Self {
            id: request.id.clone(),
            decision,
            context,
        }
    }
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseStatus::Pending => write!(f, "PENDING"),
            ReleaseStatus::Approved => write!(f, "APPROVED"),
            ReleaseStatus::Rejected => write!(f, "REJECTED"),
            ReleaseStatus::Live => write!(f, "LIVE"),
        }
    }
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseType::Single => write!(f, "Single"),
            ReleaseType::Ep => write!(f, "EP"),
            ReleaseType::Album => write!(f, "Album"),
            ReleaseType::Mixtape => write!(f, "Mixtape"),
        }
    }
}
