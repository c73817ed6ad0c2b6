use super::entity::{ReleaseRequest, ReleaseStatus};
use crate::domain::{DomainError, DomainResult};

/// The only legal status moves:
/// PENDING -> APPROVED, PENDING -> REJECTED, APPROVED -> LIVE.
/// REJECTED and LIVE never change again.
pub fn validate_release_transition(from: ReleaseStatus, to: ReleaseStatus) -> DomainResult<()> {
    use ReleaseStatus::*;
    match (from, to) {
        (Pending, Approved) | (Pending, Rejected) | (Approved, Live) => Ok(()),
        (from, to) => Err(DomainError::InvalidStateTransition(format!(
            "release {} -> {}",
            from, to
        ))),
    }
}

/// Validates all ReleaseRequest invariants
pub fn validate_release_request(request: &ReleaseRequest) -> DomainResult<()> {
    validate_identity(request)?;
    validate_deletion_flag(request)?;
    validate_catalog_codes(request)?;
    Ok(())
}

fn validate_identity(request: &ReleaseRequest) -> DomainResult<()> {
    if request.id.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Release request id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// deletion_requested only lives on LIVE or APPROVED requests
fn validate_deletion_flag(request: &ReleaseRequest) -> DomainResult<()> {
    if request.deletion_requested && !request.requires_deletion_review() {
        return Err(DomainError::InvariantViolation(format!(
            "Release '{}' is {} but flagged for deletion",
            request.id, request.status
        )));
    }
    Ok(())
}

/// Once approved, every track without an existing reference carries a code,
/// and no track carries both.
fn validate_catalog_codes(request: &ReleaseRequest) -> DomainResult<()> {
    for (idx, track) in request.tracks.iter().enumerate() {
        if track.existing_reference().is_some() && track.generated_hueq.is_some() {
            return Err(DomainError::InvariantViolation(format!(
                "Track {} of release '{}' has both an existing and a generated code",
                idx, request.id
            )));
        }
        if matches!(request.status, ReleaseStatus::Approved | ReleaseStatus::Live)
            && track.needs_generated_code()
        {
            return Err(DomainError::InvariantViolation(format!(
                "Track {} of approved release '{}' has no catalog code",
                idx, request.id
            )));
        }
    }
    Ok(())
}

/// Critical ReleaseRequest Invariants:
///
/// 1. Status is monotonic along PENDING -> {APPROVED, REJECTED}, APPROVED -> LIVE
/// 2. APPROVED -> LIVE is time-triggered, never a moderator action
/// 3. deletion_requested is orthogonal to status but requires LIVE or APPROVED
/// 4. Approved tracks without an existing reference carry a generated code
/// 5. artist_name is a snapshot taken at submission

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::release::{DistributionTrack, ReleaseDraft, ReleaseType};
    use chrono::Utc;

    fn request(status: ReleaseStatus) -> ReleaseRequest {
        let draft = ReleaseDraft {
            title: "X".to_string(),
            release_type: ReleaseType::Single,
            genre: "Pop".to_string(),
            label: "Independent".to_string(),
            covers: vec![],
            additional_main_artists: vec![],
            tracks: vec![DistributionTrack::new("T1", "blob:t1", 200.0)],
            release_date: Utc::now(),
            release_message: None,
        };
        let mut req = ReleaseRequest::submit(
            "rel_1".to_string(),
            "art_1".to_string(),
            "A".to_string(),
            draft,
            Utc::now(),
        );
        req.status = status;
        req
    }

    #[test]
    fn test_legal_transitions() {
        use ReleaseStatus::*;
        assert!(validate_release_transition(Pending, Approved).is_ok());
        assert!(validate_release_transition(Pending, Rejected).is_ok());
        assert!(validate_release_transition(Approved, Live).is_ok());
    }

    #[test]
    fn test_terminal_states_never_move() {
        use ReleaseStatus::*;
        for to in [Pending, Approved, Rejected, Live] {
            assert!(validate_release_transition(Rejected, to).is_err());
            assert!(validate_release_transition(Live, to).is_err());
        }
        assert!(validate_release_transition(Pending, Live).is_err());
        assert!(validate_release_transition(Approved, Rejected).is_err());
    }

    #[test]
    fn test_pending_release_cannot_be_flagged() {
        let mut req = request(ReleaseStatus::Pending);
        assert!(req.flag_for_deletion().is_err());
        req.deletion_requested = true;
        assert!(validate_release_request(&req).is_err());
    }

    #[test]
    fn test_approved_release_without_codes_is_invalid() {
        let req = request(ReleaseStatus::Approved);
        assert!(validate_release_request(&req).is_err());

        let mut req = request(ReleaseStatus::Approved);
        req.tracks[0].generated_hueq = Some("123AB4".to_string());
        assert!(validate_release_request(&req).is_ok());
    }

    #[test]
    fn test_existing_reference_excludes_generated_code() {
        let mut req = request(ReleaseStatus::Pending);
        req.tracks[0].existing_hueq = Some("111AA1".to_string());
        req.tracks[0].generated_hueq = Some("222BB2".to_string());
        assert!(validate_release_request(&req).is_err());
    }
}
