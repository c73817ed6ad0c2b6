pub mod entity;
pub mod invariants;

pub use entity::{ArtistAccount, ArtistPick, ArtistPickKind, ArtistStatus, ModeratorAccount};
pub use invariants::{ensure_username_available, validate_artist_account, validate_artist_decision};
