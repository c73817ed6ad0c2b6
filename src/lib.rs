// src/lib.rs
// Huevify Hub - Release moderation lifecycle and catalog engine
//
// Architecture:
// - Domain-centric: lifecycle rules live in the domain types
// - Event-driven: services coordinate through the event bus
// - Write-through: every mutation reaches storage before memory
// - Sessions sync through topic-only notifications
// - Application layer: command boundary for a front end

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    validate_artist_account,
    validate_release_request,
    Album,
    // Accounts
    ArtistAccount,
    ArtistPick,
    ArtistPickKind,
    ArtistStats,
    ArtistStatus,
    BaseCatalog,
    // Catalog
    CatalogView,
    ChartState,
    DailyChartTrack,
    // Releases
    DistributionTrack,
    DomainError,
    ModeratorAccount,
    // Profile edits
    ProfileEdit,
    ProfileEditRequest,
    ProfileEditStatus,
    ReleaseDecision,
    ReleaseDraft,
    ReleasePatch,
    ReleaseRequest,
    ReleaseStatus,
    ReleaseType,
    ResolutionContext,
    ResolveRelease,
    Track,
};

// ============================================================================
// PUBLIC API - Error Types & Config
// ============================================================================

pub use config::HubConfig;
pub use error::{AppError, AppResult, AuthError};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus,
    register_sync_handlers,
    ArtistAccountRemoved,
    CatalogInvalidated,
    DataChanged,
    DomainEvent,
    EventBus,
    EventLogEntry,
    PlaysUpdated,
    ProfileEditResolved,
    ReleaseRemoved,
    ReleaseResolved,
    ReleaseSubmitted,
    ReleaseUpdated,
    ReleasesPublished,
    SyncHandle,
    SyncHub,
    SyncSubscription,
    SyncTopic,
    TrackRetired,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, create_memory_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    AccountRepository, KeyValueStore, KvAccountRepository, KvPlayCountRepository,
    KvReleaseRepository, PlayCountRepository, ReleaseRepository, SqliteKeyValueStore,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    CatalogService, DecisionOutcome, DeleteOutcome, LifecycleService, ListenSession,
    PlayCountService, ResolveOutcome, Scheduler, Session,
};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::AppState;

pub use application::commands;
pub use application::dto;
