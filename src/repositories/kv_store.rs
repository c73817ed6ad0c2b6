// src/repositories/kv_store.rs
//
// Generic key -> JSON blob store.
// Every persisted slice of hub state is one read-modify-write blob.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::ConnectionPool;
use crate::error::AppResult;

/// Logical storage keys
pub mod keys {
    pub const ARTISTS: &str = "huevify_artists";
    pub const MODERATOR: &str = "huevify_moderator";
    pub const RELEASE_REQUESTS: &str = "huevify_release_requests";
    pub const PROFILE_EDITS: &str = "huevify_profile_edits";
    pub const RETIRED_TRACKS: &str = "huevify_retired_tracks";
    pub const PLAYS: &str = "huevify_plays";
    pub const LAST_LISTEN: &str = "huevify_last_listen";
    pub const DAILY_CHART: &str = "huevify_daily_chart";
    pub const CHART_BASELINE: &str = "huevify_chart_baseline";
    pub const CHART_LAST_ROLLOVER: &str = "huevify_chart_last_rollover";
    pub const AMBIENT_LAST_HOUR: &str = "huevify_ambient_last_hour";
    pub const RECENT: &str = "huevify_recent";
}

#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

pub struct SqliteKeyValueStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteKeyValueStore {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let conn = self.pool.get()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Typed access to blobs with fallback to defaults.
///
/// Absent keys and corrupt blobs both yield the default; corruption is
/// logged. Collections are decoded entry by entry so one malformed entry
/// does not hide the rest.
#[derive(Clone)]
pub struct BlobStore {
    store: Arc<dyn KeyValueStore>,
}

impl BlobStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load_or_default<T>(&self, key: &str) -> AppResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.store.get(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                log::warn!("Discarding corrupt blob '{}': {}", key, e);
                Ok(T::default())
            }
        }
    }

    pub fn load_optional<T>(&self, key: &str) -> AppResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Discarding corrupt blob '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    pub fn load_list<T>(&self, key: &str) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let entries: Vec<serde_json::Value> = self.load_or_default(key)?;
        let total = entries.len();
        let items: Vec<T> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    log::warn!("Skipping malformed entry {} of '{}': {}", idx, key, e);
                    None
                }
            })
            .collect();
        if items.len() != total {
            log::warn!("Loaded {}/{} entries of '{}'", items.len(), total, key);
        }
        Ok(items)
    }

    pub fn save<T>(&self, key: &str, value: &T) -> AppResult<()>
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.store.put(key, &raw)
    }

    pub fn remove(&self, key: &str) -> AppResult<()> {
        self.store.remove(key)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::{create_memory_pool, initialize_database};

    /// Fresh in-memory store with the schema applied
    pub fn memory_store() -> Arc<dyn KeyValueStore> {
        let pool = create_memory_pool().unwrap();
        {
            let conn = pool.get().unwrap();
            initialize_database(&conn).unwrap();
        }
        Arc::new(SqliteKeyValueStore::new(Arc::new(pool)))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::memory_store;
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: String,
        n: u32,
    }

    #[test]
    fn test_put_get_remove() {
        let store = memory_store();
        assert_eq!(store.get("k").unwrap(), None);
        store.put("k", "1").unwrap();
        store.put("k", "2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("2"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_absent_key_yields_default() {
        let blobs = BlobStore::new(memory_store());
        let plays: HashMap<String, u64> = blobs.load_or_default(keys::PLAYS).unwrap();
        assert!(plays.is_empty());
    }

    #[test]
    fn test_corrupt_blob_yields_default() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get()
            .returning(|_| Ok(Some("{not json".to_string())));
        let blobs = BlobStore::new(Arc::new(mock));

        let plays: HashMap<String, u64> = blobs.load_or_default(keys::PLAYS).unwrap();
        assert!(plays.is_empty());
        let marker: Option<String> = blobs.load_optional(keys::AMBIENT_LAST_HOUR).unwrap();
        assert!(marker.is_none());
    }

    #[test]
    fn test_malformed_entries_are_skipped_individually() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get().returning(|_| {
            Ok(Some(
                r#"[{"id":"a","n":1},{"id":"b"},{"id":"c","n":3}]"#.to_string(),
            ))
        });
        let blobs = BlobStore::new(Arc::new(mock));

        let entries: Vec<Entry> = blobs.load_list("entries").unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_storage_failure_propagates() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get()
            .returning(|_| Err(crate::error::AppError::Pool("down".to_string())));
        let blobs = BlobStore::new(Arc::new(mock));

        let result: AppResult<Vec<Entry>> = blobs.load_list("entries");
        assert!(result.is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let blobs = BlobStore::new(memory_store());
        let entries = vec![Entry { id: "a".to_string(), n: 1 }];
        blobs.save("entries", &entries).unwrap();
        let loaded: Vec<Entry> = blobs.load_list("entries").unwrap();
        assert_eq!(loaded, entries);
    }
}
