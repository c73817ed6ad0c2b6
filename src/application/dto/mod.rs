// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are caller-friendly representations
// - DTOs never carry credentials
// - Conversion FROM domain entities only (never TO)

use serde::{Deserialize, Serialize};

use crate::domain::{
    ArtistAccount, ArtistPick, DailyChartTrack, ProfileEditRequest, ReleaseRequest,
};

// ============================================================================
// ACTION RESULTS
// ============================================================================

/// Outcome of an account operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResultDto {
    pub success: bool,
    pub message: String,
}

impl ActionResultDto {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// ============================================================================
// ACCOUNT DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistAccountDto {
    pub id: String,
    pub artist_name: String,
    pub username: String,
    pub status: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub artist_pick: Option<ArtistPick>,
}

impl From<ArtistAccount> for ArtistAccountDto {
    fn from(account: ArtistAccount) -> Self {
        Self {
            id: account.id,
            artist_name: account.artist_name,
            username: account.username,
            status: account.status.to_string(),
            avatar: account.avatar,
            bio: account.bio,
            artist_pick: account.artist_pick,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEditDto {
    pub id: String,
    pub artist_id: String,
    pub artist_name: String,
    pub new_avatar: Option<String>,
    pub new_bio: Option<String>,
    pub status: String,
}

impl From<ProfileEditRequest> for ProfileEditDto {
    fn from(edit: ProfileEditRequest) -> Self {
        Self {
            id: edit.id,
            artist_id: edit.artist_id,
            artist_name: edit.artist_name,
            new_avatar: edit.new_avatar,
            new_bio: edit.new_bio,
            status: format!("{:?}", edit.status).to_uppercase(),
        }
    }
}

// ============================================================================
// RELEASE DTOs
// ============================================================================

/// Queue row of a release request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSummaryDto {
    pub id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    pub status: String,
    pub release_type: String,
    pub release_date: String,
    pub submission_time: Option<String>,
    pub track_count: usize,
    pub deletion_requested: bool,
}

impl From<ReleaseRequest> for ReleaseSummaryDto {
    fn from(request: ReleaseRequest) -> Self {
        Self {
            track_count: request.tracks.len(),
            id: request.id,
            title: request.title,
            artist_id: request.artist_id,
            artist_name: request.artist_name,
            status: request.status.to_string(),
            release_type: request.release_type.to_string(),
            release_date: request.release_date.to_rfc3339(),
            submission_time: request.submission_time.map(|t| t.to_rfc3339()),
            deletion_requested: request.deletion_requested,
        }
    }
}

// ============================================================================
// CHART DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntryDto {
    pub rank: usize,
    pub track_id: String,
    pub title: String,
    pub artist: String,
    pub daily_plays: u64,
    pub total_plays: u64,
}

impl ChartEntryDto {
    pub fn ranked(entries: Vec<DailyChartTrack>) -> Vec<Self> {
        entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| Self {
                rank: idx + 1,
                track_id: entry.track.id,
                title: entry.track.title,
                artist: entry.track.artist,
                daily_plays: entry.daily_plays,
                total_plays: entry.track.plays,
            })
            .collect()
    }
}
