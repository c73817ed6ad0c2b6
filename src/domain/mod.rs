// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod account;
pub mod catalog;
pub mod chart;
pub mod identifiers;
pub mod profile_edit;
pub mod release;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Accounts
pub use account::{
    validate_artist_account, ArtistAccount, ArtistPick, ArtistPickKind, ArtistStatus,
    ModeratorAccount,
};

// Releases
pub use release::{
    validate_release_request, DistributionTrack, ReleaseDecision, ReleaseDraft, ReleasePatch,
    ReleaseRequest, ReleaseStatus, ReleaseType, ResolutionContext, ResolveRelease,
};

// Profile edits
pub use profile_edit::{ProfileEdit, ProfileEditRequest, ProfileEditStatus};

// Catalog (Derived Data)
pub use catalog::{Album, ArtistStats, BaseCatalog, CatalogView, Track};
pub use chart::{ChartState, DailyChartTrack};

// Identifiers
pub use identifiers::{is_catalog_code, new_request_id, HueqRegistry, IdKind};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("A moderator account already exists")]
    ModeratorExists,

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Entity not found: {0}")]
    NotFound(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
