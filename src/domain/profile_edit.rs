// src/domain/profile_edit.rs
//
// Profile Edit Request Entity
//
// An artist's proposed change to avatar, bio or artist pick.
// Applied to the account only after moderator approval.

use serde::{Deserialize, Serialize};

use crate::domain::account::{ArtistAccount, ArtistPick};
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileEditStatus {
    Pending,
    Approved,
    Rejected,
}

/// The editable part of a profile, as submitted by the artist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEdit {
    pub new_avatar: Option<String>,
    pub new_bio: Option<String>,
    pub new_artist_pick: Option<ArtistPick>,
}

/// A pending or resolved profile change
///
/// CRITICAL INVARIANTS:
/// - Terminal once APPROVED or REJECTED
/// - Only present fields overwrite the account on approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEditRequest {
    pub id: String,
    pub artist_id: String,
    pub artist_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_artist_pick: Option<ArtistPick>,
    pub status: ProfileEditStatus,
}

impl ProfileEditRequest {
    pub fn new(id: String, account: &ArtistAccount, edit: ProfileEdit) -> Self {
        Self {
            id,
            artist_id: account.id.clone(),
            artist_name: account.artist_name.clone(),
            new_avatar: edit.new_avatar,
            new_bio: edit.new_bio,
            new_artist_pick: edit.new_artist_pick,
            status: ProfileEditStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ProfileEditStatus::Pending
    }

    /// Copy the present fields onto the account
    pub fn apply_to(&self, account: &mut ArtistAccount) {
        if let Some(avatar) = &self.new_avatar {
            account.avatar = Some(avatar.clone());
        }
        if let Some(bio) = &self.new_bio {
            account.bio = Some(bio.clone());
        }
        if let Some(pick) = &self.new_artist_pick {
            account.artist_pick = Some(pick.clone());
        }
    }

    /// Resolve the request. Repeating the recorded decision is accepted.
    pub fn resolve(&mut self, target: ProfileEditStatus) -> DomainResult<bool> {
        match (self.status, target) {
            (ProfileEditStatus::Pending, ProfileEditStatus::Approved | ProfileEditStatus::Rejected) => {
                self.status = target;
                Ok(true)
            }
            (current, target) if current == target => Ok(false),
            (current, target) => Err(DomainError::InvalidStateTransition(format!(
                "profile edit {:?} -> {:?}",
                current, target
            ))),
        }
    }
}
