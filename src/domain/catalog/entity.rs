use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::release::ReleaseType;

/// A playable catalog track, either seeded or materialized from a release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub cover: String,
    /// Seconds
    pub duration: f64,
    pub url: String,
    /// Never decreases
    pub plays: u64,
    pub genre: String,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hueq: Option<String>,
    #[serde(default)]
    pub main_artists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub covers: Vec<String>,
    pub track_ids: Vec<String>,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub release_type: Option<ReleaseType>,
    #[serde(default)]
    pub main_artists: Vec<String>,
}

/// The static catalog every merge starts from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseCatalog {
    pub tracks: Vec<Track>,
    pub albums: Vec<Album>,
}

/// Effective catalog derived from the base catalog and visible releases.
/// Never a source of truth; recomputed on every merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub tracks: Vec<Track>,
    pub albums: Vec<Album>,
    /// Sorted, de-duplicated artist names
    pub artist_index: Vec<String>,
}

impl CatalogView {
    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn album(&self, id: &str) -> Option<&Album> {
        self.albums.iter().find(|a| a.id == id)
    }

    pub fn track_by_hueq(&self, code: &str) -> Option<&Track> {
        let code = code.trim();
        self.tracks
            .iter()
            .find(|t| t.hueq.as_deref().is_some_and(|h| h.eq_ignore_ascii_case(code)))
    }
}

/// Per-artist aggregate shown on artist pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistStats {
    pub monthly_plays: u64,
    pub global_rank: u32,
}
