// src/events/mod.rs
//
// Event System - Public API
//
// Synchronous in-process bus for domain events plus the cross-session
// sync notifier.

pub mod bus;
pub mod handlers;
pub mod sync;
pub mod types;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use types::{
    ArtistAccountRemoved, CatalogInvalidated, DataChanged, DomainEvent, PlaysUpdated,
    ProfileEditResolved, ReleaseRemoved, ReleaseResolved, ReleaseSubmitted, ReleaseUpdated,
    ReleasesPublished, TrackRetired,
};

pub use bus::{EventBus, EventLogEntry};
pub use handlers::register_sync_handlers;
pub use sync::{SyncHandle, SyncHub, SyncSubscription, SyncTopic};

pub fn create_event_bus() -> EventBus {
    EventBus::new()
}
