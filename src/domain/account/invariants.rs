use super::entity::{ArtistAccount, ArtistStatus};
use crate::domain::{DomainError, DomainResult};

/// Validates all ArtistAccount invariants
pub fn validate_artist_account(account: &ArtistAccount) -> DomainResult<()> {
    if account.id.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Artist account id cannot be empty".to_string(),
        ));
    }
    if account.username.is_empty() {
        return Err(DomainError::InvariantViolation(
            "Artist username cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Verification decisions are only taken on PENDING accounts.
/// Repeating the decision already recorded is allowed (no-op for the caller).
pub fn validate_artist_decision(current: ArtistStatus, target: ArtistStatus) -> DomainResult<()> {
    match (current, target) {
        (ArtistStatus::Pending, ArtistStatus::Approved | ArtistStatus::Rejected) => Ok(()),
        (a, b) if a == b => Ok(()),
        (from, to) => Err(DomainError::InvalidStateTransition(format!(
            "artist account {} -> {}",
            from, to
        ))),
    }
}

/// Usernames are unique across artist accounts (exact, case-sensitive)
pub fn ensure_username_available(accounts: &[ArtistAccount], username: &str) -> DomainResult<()> {
    if accounts.iter().any(|a| a.username == username) {
        return Err(DomainError::DuplicateUsername(username.to_string()));
    }
    Ok(())
}
