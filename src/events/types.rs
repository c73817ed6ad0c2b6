// src/events/types.rs
//
// All domain events of the hub.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ReleaseDecision, ResolutionContext};
use crate::events::sync::SyncTopic;

pub trait DomainEvent: std::fmt::Debug + Clone {
    fn event_id(&self) -> Uuid;
    fn occurred_at(&self) -> DateTime<Utc>;
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// RELEASE LIFECYCLE EVENTS
// ============================================================================

/// A new PENDING release request was stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseSubmitted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub release_id: String,
    pub artist_id: String,
}

impl ReleaseSubmitted {
    pub fn new(release_id: String, artist_id: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            release_id,
            artist_id,
        }
    }
}

impl DomainEvent for ReleaseSubmitted {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ReleaseSubmitted" }
}

/// Fields of an existing request were replaced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseUpdated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub release_id: String,
    /// Whether the request is part of the visible catalog
    pub visible: bool,
}

impl ReleaseUpdated {
    pub fn new(release_id: String, visible: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            release_id,
            visible,
        }
    }
}

impl DomainEvent for ReleaseUpdated {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ReleaseUpdated" }
}

/// A moderator decision changed a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseResolved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub release_id: String,
    pub decision: ReleaseDecision,
    pub context: ResolutionContext,
}

impl ReleaseResolved {
    pub fn new(release_id: String, decision: ReleaseDecision, context: ResolutionContext) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            release_id,
            decision,
            context,
        }
    }
}

impl DomainEvent for ReleaseResolved {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ReleaseResolved" }
}

/// APPROVED requests whose date passed went LIVE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasesPublished {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub release_ids: Vec<String>,
}

impl ReleasesPublished {
    pub fn new(release_ids: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            release_ids,
        }
    }
}

impl DomainEvent for ReleasesPublished {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ReleasesPublished" }
}

/// A request left storage, either withdrawn or retracted.
/// `track_ids` are the catalog tracks it had materialized itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRemoved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub release_id: String,
    pub track_ids: Vec<String>,
}

impl ReleaseRemoved {
    pub fn new(release_id: String, track_ids: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            release_id,
            track_ids,
        }
    }
}

impl DomainEvent for ReleaseRemoved {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ReleaseRemoved" }
}

/// A moderator took a base-catalog track out of the effective catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRetired {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub track_id: String,
}

impl TrackRetired {
    pub fn new(track_id: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            track_id,
        }
    }
}

impl DomainEvent for TrackRetired {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "TrackRetired" }
}

// ============================================================================
// ACCOUNT EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEditResolved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub request_id: String,
    pub artist_id: String,
    pub approved: bool,
}

impl ProfileEditResolved {
    pub fn new(request_id: String, artist_id: String, approved: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            request_id,
            artist_id,
            approved,
        }
    }
}

impl DomainEvent for ProfileEditResolved {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ProfileEditResolved" }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistAccountRemoved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub artist_id: String,
}

impl ArtistAccountRemoved {
    pub fn new(artist_id: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            artist_id,
        }
    }
}

impl DomainEvent for ArtistAccountRemoved {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "ArtistAccountRemoved" }
}

// ============================================================================
// CATALOG / STATISTICS EVENTS
// ============================================================================

/// The effective catalog must be re-merged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInvalidated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub reason: String,
}

impl CatalogInvalidated {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            reason: reason.into(),
        }
    }
}

impl DomainEvent for CatalogInvalidated {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "CatalogInvalidated" }
}

/// Persisted play counts changed for the listed tracks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaysUpdated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub track_ids: Vec<String>,
}

impl PlaysUpdated {
    pub fn new(track_ids: Vec<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            track_ids,
        }
    }
}

impl DomainEvent for PlaysUpdated {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "PlaysUpdated" }
}

// ============================================================================
// SYNC EVENTS
// ============================================================================

/// Shared storage under `topic` was written by this session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataChanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub topic: SyncTopic,
}

impl DataChanged {
    pub fn new(topic: SyncTopic) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            topic,
        }
    }
}

impl DomainEvent for DataChanged {
    fn event_id(&self) -> Uuid { self.event_id }
    fn occurred_at(&self) -> DateTime<Utc> { self.occurred_at }
    fn event_type(&self) -> &'static str { "DataChanged" }
}
