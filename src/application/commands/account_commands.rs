// src/application/commands/account_commands.rs
//
// Account Command Handlers
//
// RULES:
// - Account operations answer with ActionResultDto
// - Queries answer with DTOs or a serialized ErrorResponse

use crate::application::dto::{ActionResultDto, ArtistAccountDto, ProfileEditDto};
use crate::application::error_handling::ToErrorResponse;
use crate::application::state::AppState;
use crate::domain::ProfileEdit;
use crate::error::AppResult;
use crate::services::{DecisionOutcome, Session};

fn action<T>(result: AppResult<T>, success: impl FnOnce(T) -> String) -> ActionResultDto {
    match result {
        Ok(value) => ActionResultDto::ok(success(value)),
        Err(e) => {
            log::debug!("Account action failed: {}", e);
            ActionResultDto::failed(e.to_string())
        }
    }
}

fn decision_message(outcome: DecisionOutcome, applied: &str) -> String {
    match outcome {
        DecisionOutcome::Applied => applied.to_string(),
        DecisionOutcome::Unchanged => "Already decided".to_string(),
    }
}

// ============================================================================
// ARTISTS
// ============================================================================

pub fn register_artist(
    state: &AppState,
    artist_name: &str,
    username: &str,
    password: &str,
) -> ActionResultDto {
    action(
        state
            .lifecycle_service
            .register_artist(artist_name, username, password),
        |_| "Registration received, awaiting moderator approval".to_string(),
    )
}

pub fn login_artist(state: &AppState, username: &str, password: &str) -> ActionResultDto {
    action(
        state.lifecycle_service.login_artist(username, password),
        |account| format!("Welcome back, {}", account.artist_name),
    )
}

pub fn change_artist_password(
    state: &AppState,
    artist_id: &str,
    new_password: &str,
) -> ActionResultDto {
    action(
        state
            .lifecycle_service
            .change_artist_password(artist_id, new_password),
        |_| "Password changed".to_string(),
    )
}

pub fn current_artist(state: &AppState) -> Option<ArtistAccountDto> {
    state
        .lifecycle_service
        .current_artist()
        .map(ArtistAccountDto::from)
}

pub fn submit_profile_edit(state: &AppState, edit: ProfileEdit) -> ActionResultDto {
    action(state.lifecycle_service.submit_profile_edit(edit), |_| {
        "Profile changes sent for review".to_string()
    })
}

// ============================================================================
// MODERATOR
// ============================================================================

pub fn register_moderator(state: &AppState, username: &str, password: &str) -> ActionResultDto {
    action(
        state.lifecycle_service.register_moderator(username, password),
        |_| "Moderator account created".to_string(),
    )
}

pub fn login_moderator(state: &AppState, username: &str, password: &str) -> ActionResultDto {
    action(
        state.lifecycle_service.login_moderator(username, password),
        |_| "Moderator session started".to_string(),
    )
}

pub fn change_moderator_password(state: &AppState, new_password: &str) -> ActionResultDto {
    action(
        state.lifecycle_service.change_moderator_password(new_password),
        |_| "Password changed".to_string(),
    )
}

pub fn approve_artist(state: &AppState, artist_id: &str) -> ActionResultDto {
    action(state.lifecycle_service.approve_artist(artist_id), |o| {
        decision_message(o, "Artist approved")
    })
}

pub fn reject_artist(state: &AppState, artist_id: &str) -> ActionResultDto {
    action(state.lifecycle_service.reject_artist(artist_id), |o| {
        decision_message(o, "Artist rejected")
    })
}

pub fn delete_artist_account(state: &AppState, artist_id: &str) -> ActionResultDto {
    action(
        state.lifecycle_service.delete_artist_account(artist_id),
        |_| "Artist account deleted".to_string(),
    )
}

pub fn list_artists(state: &AppState) -> Result<Vec<ArtistAccountDto>, String> {
    let artists = state.lifecycle_service.all_artists().to_error_response()?;
    Ok(artists.into_iter().map(ArtistAccountDto::from).collect())
}

pub fn list_pending_artists(state: &AppState) -> Result<Vec<ArtistAccountDto>, String> {
    let artists = state.lifecycle_service.pending_artists().to_error_response()?;
    Ok(artists.into_iter().map(ArtistAccountDto::from).collect())
}

pub fn list_pending_profile_edits(state: &AppState) -> Result<Vec<ProfileEditDto>, String> {
    let edits = state
        .lifecycle_service
        .pending_profile_edits()
        .to_error_response()?;
    Ok(edits.into_iter().map(ProfileEditDto::from).collect())
}

pub fn approve_profile_edit(state: &AppState, request_id: &str) -> ActionResultDto {
    action(
        state.lifecycle_service.approve_profile_edit(request_id),
        |o| decision_message(o, "Profile changes applied"),
    )
}

pub fn reject_profile_edit(state: &AppState, request_id: &str) -> ActionResultDto {
    action(
        state.lifecycle_service.reject_profile_edit(request_id),
        |o| decision_message(o, "Profile changes rejected"),
    )
}

// ============================================================================
// SESSION
// ============================================================================

pub fn current_session(state: &AppState) -> Option<Session> {
    state.lifecycle_service.current_session()
}

pub fn logout(state: &AppState) -> ActionResultDto {
    state.lifecycle_service.logout();
    ActionResultDto::ok("Logged out")
}
