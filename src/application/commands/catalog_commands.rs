// src/application/commands/catalog_commands.rs
//
// Catalog & Play Command Handlers

use crate::application::dto::ChartEntryDto;
use crate::application::error_handling::ToErrorResponse;
use crate::application::state::AppState;
use crate::domain::{Album, ArtistStats, Track};

pub fn list_tracks(state: &AppState) -> Result<Vec<Track>, String> {
    state.catalog_service.tracks().to_error_response()
}

pub fn list_albums(state: &AppState) -> Result<Vec<Album>, String> {
    state.catalog_service.albums().to_error_response()
}

pub fn list_catalog_artists(state: &AppState) -> Result<Vec<String>, String> {
    state.catalog_service.artists().to_error_response()
}

pub fn get_album(state: &AppState, album_id: &str) -> Result<Option<Album>, String> {
    state.catalog_service.album(album_id).to_error_response()
}

pub fn find_track_by_hueq(state: &AppState, code: &str) -> Result<Option<Track>, String> {
    state.catalog_service.track_by_hueq(code).to_error_response()
}

pub fn get_artist_stats(state: &AppState, artist_name: &str) -> Result<ArtistStats, String> {
    state
        .catalog_service
        .artist_stats(artist_name)
        .to_error_response()
}

pub fn get_daily_chart(state: &AppState) -> Result<Vec<ChartEntryDto>, String> {
    let chart = state.play_count_service.daily_chart().to_error_response()?;
    Ok(ChartEntryDto::ranked(chart))
}

// ============================================================================
// PLAYBACK
// ============================================================================

/// The player switched to `track_id`; it joins the history
pub fn start_playback(state: &AppState, track_id: &str) -> Result<Vec<Track>, String> {
    let track = state
        .catalog_service
        .track(track_id)
        .to_error_response()?
        .ok_or_else(|| format!("Track {} not found", track_id))?;
    state.play_count_service.start_listening(track_id);
    state.play_count_service.record_play(&track).to_error_response()
}

/// Returns the new play count when this sample earned a credit
pub fn report_playback_progress(state: &AppState, position_secs: f64) -> Result<Option<u64>, String> {
    state
        .play_count_service
        .report_progress(position_secs)
        .to_error_response()
}

pub fn stop_playback(state: &AppState) {
    state.play_count_service.stop_listening();
}

pub fn recently_played(state: &AppState) -> Result<Vec<Track>, String> {
    state.play_count_service.recent().to_error_response()
}
