pub mod entity;
pub mod invariants;

pub use entity::{
    DistributionTrack, ReleaseDecision, ReleaseDraft, ReleasePatch, ReleaseRequest,
    ReleaseStatus, ReleaseType, ResolutionContext, ResolveRelease, RELEASE_ALBUM_PREFIX,
    RELEASE_TRACK_PREFIX,
};
pub use invariants::{validate_release_request, validate_release_transition};
