// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO event emission
// - NO cross-repository calls
// - Absent or corrupt blobs degrade to defaults

pub mod account_repository;
pub mod kv_store;
pub mod play_count_repository;
pub mod release_repository;

pub use account_repository::{AccountRepository, KvAccountRepository};
pub use kv_store::{keys, BlobStore, KeyValueStore, SqliteKeyValueStore};
pub use play_count_repository::{KvPlayCountRepository, PlayCountRepository};
pub use release_repository::{KvReleaseRepository, ReleaseRepository};
