// src/repositories/release_repository.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::profile_edit::ProfileEditRequest;
use crate::domain::release::ReleaseRequest;
use crate::error::AppResult;
use crate::repositories::kv_store::{keys, BlobStore, KeyValueStore};

pub trait ReleaseRepository: Send + Sync {
    fn list_releases(&self) -> AppResult<Vec<ReleaseRequest>>;
    fn save_releases(&self, releases: &[ReleaseRequest]) -> AppResult<()>;
    fn list_profile_edits(&self) -> AppResult<Vec<ProfileEditRequest>>;
    fn save_profile_edits(&self, edits: &[ProfileEditRequest]) -> AppResult<()>;
    /// Seed-catalog track ids a moderator removed from the effective catalog
    fn list_retired_tracks(&self) -> AppResult<BTreeSet<String>>;
    fn save_retired_tracks(&self, ids: &BTreeSet<String>) -> AppResult<()>;
}

pub struct KvReleaseRepository {
    blobs: BlobStore,
}

impl KvReleaseRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            blobs: BlobStore::new(store),
        }
    }
}

impl ReleaseRepository for KvReleaseRepository {
    fn list_releases(&self) -> AppResult<Vec<ReleaseRequest>> {
        self.blobs.load_list(keys::RELEASE_REQUESTS)
    }

    fn save_releases(&self, releases: &[ReleaseRequest]) -> AppResult<()> {
        self.blobs.save(keys::RELEASE_REQUESTS, releases)
    }

    fn list_profile_edits(&self) -> AppResult<Vec<ProfileEditRequest>> {
        self.blobs.load_list(keys::PROFILE_EDITS)
    }

    fn save_profile_edits(&self, edits: &[ProfileEditRequest]) -> AppResult<()> {
        self.blobs.save(keys::PROFILE_EDITS, edits)
    }

    fn list_retired_tracks(&self) -> AppResult<BTreeSet<String>> {
        self.blobs.load_or_default(keys::RETIRED_TRACKS)
    }

    fn save_retired_tracks(&self, ids: &BTreeSet<String>) -> AppResult<()> {
        self.blobs.save(keys::RETIRED_TRACKS, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::kv_store::test_support::memory_store;

    #[test]
    fn test_release_without_tracks_field_still_loads() {
        let store = memory_store();
        store
            .put(
                keys::RELEASE_REQUESTS,
                r#"[{"id":"rel_1","artistId":"art_1","artistName":"A","status":"PENDING",
                    "title":"X","type":"Single","releaseDate":"2024-01-01T00:00:00Z"},
                   {"id":"rel_2","status":"LIVE"}]"#,
            )
            .unwrap();
        let repo = KvReleaseRepository::new(store);

        let releases = repo.list_releases().unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].id, "rel_1");
        assert!(releases[0].tracks.is_empty());
        assert!(!releases[0].deletion_requested);
    }

    #[test]
    fn test_retired_tracks_round_trip() {
        let repo = KvReleaseRepository::new(memory_store());
        assert!(repo.list_retired_tracks().unwrap().is_empty());

        let ids: BTreeSet<String> = ["t3".to_string()].into_iter().collect();
        repo.save_retired_tracks(&ids).unwrap();
        assert_eq!(repo.list_retired_tracks().unwrap(), ids);
    }
}
