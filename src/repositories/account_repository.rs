// src/repositories/account_repository.rs

use std::sync::Arc;

use crate::domain::account::{ArtistAccount, ModeratorAccount};
use crate::error::AppResult;
use crate::repositories::kv_store::{keys, BlobStore, KeyValueStore};

pub trait AccountRepository: Send + Sync {
    fn list_artists(&self) -> AppResult<Vec<ArtistAccount>>;
    fn save_artists(&self, artists: &[ArtistAccount]) -> AppResult<()>;
    fn get_moderator(&self) -> AppResult<Option<ModeratorAccount>>;
    fn save_moderator(&self, moderator: Option<&ModeratorAccount>) -> AppResult<()>;
}

pub struct KvAccountRepository {
    blobs: BlobStore,
}

impl KvAccountRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            blobs: BlobStore::new(store),
        }
    }
}

impl AccountRepository for KvAccountRepository {
    fn list_artists(&self) -> AppResult<Vec<ArtistAccount>> {
        self.blobs.load_list(keys::ARTISTS)
    }

    fn save_artists(&self, artists: &[ArtistAccount]) -> AppResult<()> {
        self.blobs.save(keys::ARTISTS, artists)
    }

    fn get_moderator(&self) -> AppResult<Option<ModeratorAccount>> {
        self.blobs.load_optional(keys::MODERATOR)
    }

    fn save_moderator(&self, moderator: Option<&ModeratorAccount>) -> AppResult<()> {
        match moderator {
            Some(m) => self.blobs.save(keys::MODERATOR, m),
            None => self.blobs.remove(keys::MODERATOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::kv_store::test_support::memory_store;

    #[test]
    fn test_artists_round_trip() {
        let repo = KvAccountRepository::new(memory_store());
        assert!(repo.list_artists().unwrap().is_empty());

        let artist = ArtistAccount::new(
            "art_1".to_string(),
            "Null Pointer".to_string(),
            "np".to_string(),
            "pw".to_string(),
        );
        repo.save_artists(&[artist.clone()]).unwrap();
        assert_eq!(repo.list_artists().unwrap(), vec![artist]);
    }

    #[test]
    fn test_moderator_singleton() {
        let repo = KvAccountRepository::new(memory_store());
        assert!(repo.get_moderator().unwrap().is_none());

        let moderator = ModeratorAccount {
            username: "mod".to_string(),
            password: "pw".to_string(),
        };
        repo.save_moderator(Some(&moderator)).unwrap();
        assert_eq!(repo.get_moderator().unwrap(), Some(moderator));

        repo.save_moderator(None).unwrap();
        assert!(repo.get_moderator().unwrap().is_none());
    }
}
