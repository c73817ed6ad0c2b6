// src/application/commands/release_commands.rs
//
// Release Command Handlers
//
// RULES:
// - Accept drafts and patches
// - Call the lifecycle service
// - Return DTOs
// - Never contain business logic

use crate::application::dto::ReleaseSummaryDto;
use crate::application::error_handling::ToErrorResponse;
use crate::application::state::AppState;
use crate::domain::{
    ReleaseDecision, ReleaseDraft, ReleasePatch, ReleaseRequest, ResolutionContext,
    ResolveRelease,
};
use crate::services::{DecisionOutcome, DeleteOutcome, ResolveOutcome};

pub fn submit_release(state: &AppState, draft: ReleaseDraft) -> Result<ReleaseSummaryDto, String> {
    let request = state
        .lifecycle_service
        .submit_release(draft)
        .to_error_response()?;
    Ok(ReleaseSummaryDto::from(request))
}

/// Moderator upload; `artist_name` None files it under Various Artists
pub fn submit_release_as_moderator(
    state: &AppState,
    draft: ReleaseDraft,
    artist_name: Option<String>,
) -> Result<ReleaseSummaryDto, String> {
    let request = state
        .lifecycle_service
        .submit_release_as_moderator(draft, artist_name)
        .to_error_response()?;
    Ok(ReleaseSummaryDto::from(request))
}

pub fn update_release(
    state: &AppState,
    release_id: &str,
    patch: ReleasePatch,
) -> Result<ReleaseRequest, String> {
    state
        .lifecycle_service
        .update_release_request(release_id, patch)
        .to_error_response()
}

pub fn delete_release(state: &AppState, release_id: &str) -> Result<DeleteOutcome, String> {
    state
        .lifecycle_service
        .delete_release(release_id)
        .to_error_response()
}

/// Full request, for the editor
pub fn get_release(state: &AppState, release_id: &str) -> Result<Option<ReleaseRequest>, String> {
    let session_releases = match state.lifecycle_service.current_artist() {
        Some(_) => state.lifecycle_service.my_releases(),
        None => state.lifecycle_service.all_releases(),
    }
    .to_error_response()?;
    Ok(session_releases.into_iter().find(|r| r.id == release_id))
}

pub fn my_releases(state: &AppState) -> Result<Vec<ReleaseSummaryDto>, String> {
    let releases = state.lifecycle_service.my_releases().to_error_response()?;
    Ok(releases.into_iter().map(ReleaseSummaryDto::from).collect())
}

pub fn list_all_releases(state: &AppState) -> Result<Vec<ReleaseSummaryDto>, String> {
    let releases = state.lifecycle_service.all_releases().to_error_response()?;
    Ok(releases.into_iter().map(ReleaseSummaryDto::from).collect())
}

pub fn list_pending_releases(state: &AppState) -> Result<Vec<ReleaseSummaryDto>, String> {
    let releases = state
        .lifecycle_service
        .pending_releases()
        .to_error_response()?;
    Ok(releases.into_iter().map(ReleaseSummaryDto::from).collect())
}

/// Resolve against the context the moderator saw when deciding
pub fn resolve_release(
    state: &AppState,
    release_id: &str,
    decision: ReleaseDecision,
    context: ResolutionContext,
) -> Result<ResolveOutcome, String> {
    state
        .lifecycle_service
        .resolve_release(ResolveRelease {
            id: release_id.to_string(),
            decision,
            context,
        })
        .to_error_response()
}

pub fn retire_base_track(state: &AppState, track_id: &str) -> Result<DecisionOutcome, String> {
    state
        .lifecycle_service
        .retire_base_track(track_id)
        .to_error_response()
}
