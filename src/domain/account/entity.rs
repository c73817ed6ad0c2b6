use serde::{Deserialize, Serialize};

/// Verification state of an artist account.
/// Moderators move PENDING accounts to APPROVED or REJECTED; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtistStatus {
    Pending,
    Approved,
    Rejected,
}

/// What an artist pick points to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtistPickKind {
    Track,
    Album,
    Playlist,
}

/// Item featured on an artist's page, with denormalized display data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistPick {
    #[serde(rename = "type")]
    pub kind: ArtistPickKind,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

/// Identity of an artist-role actor.
///
/// `password` is kept in the clear, mirroring the stored format of the
/// product. Do not treat this type as a credential vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistAccount {
    pub id: String,
    pub artist_name: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub status: ArtistStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_pick: Option<ArtistPick>,
}

impl ArtistAccount {
    /// New accounts always start PENDING
    pub fn new(id: String, artist_name: String, username: String, password: String) -> Self {
        Self {
            id,
            artist_name,
            username,
            password,
            avatar: None,
            bio: None,
            status: ArtistStatus::Pending,
            artist_pick: None,
        }
    }

    pub fn credentials_match(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }

    pub fn is_approved(&self) -> bool {
        self.status == ArtistStatus::Approved
    }
}

/// The single moderator of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratorAccount {
    pub username: String,
    pub password: String,
}

impl ModeratorAccount {
    pub fn credentials_match(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl std::fmt::Display for ArtistStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtistStatus::Pending => write!(f, "PENDING"),
            ArtistStatus::Approved => write!(f, "APPROVED"),
            ArtistStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}
