// src/db/migrations.rs
//
// Database schema initialization and migrations
//
// PRINCIPLES:
// - Explicit schema versions
// - No automatic migrations
// - Clear error messages
// - Idempotent operations

use rusqlite::Connection;
use crate::error::{AppError, AppResult};

/// Current schema version
/// Increment this when adding migrations
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Version 1: a single key -> JSON blob table
const INITIAL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Initialize the database schema
///
/// Safe to call multiple times (idempotent).
pub fn initialize_database(conn: &Connection) -> AppResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        apply_initial_schema(conn)?;
        set_schema_version(conn, 1)?;
        log::info!("Initialized hub schema version {}", CURRENT_SCHEMA_VERSION);
    } else if current_version > CURRENT_SCHEMA_VERSION {
        return Err(AppError::Other(format!(
            "Schema version {} is newer than supported {}. Update the application.",
            current_version, CURRENT_SCHEMA_VERSION
        )));
    }

    Ok(())
}

/// Get current schema version
/// Returns 0 if schema_version table doesn't exist (fresh database)
fn get_schema_version(conn: &Connection) -> AppResult<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )
        .map_err(AppError::Database)?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .map_err(AppError::Database)?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> AppResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [version],
    )
    .map_err(AppError::Database)?;

    Ok(())
}

fn apply_initial_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(INITIAL_SCHEMA)
        .map_err(|e| AppError::Other(format!("Failed to apply initial schema: {}", e)))?;
    Ok(())
}

/// Verify database integrity
pub fn verify_database_integrity(conn: &Connection) -> AppResult<()> {
    let result: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .map_err(AppError::Database)?;

    if result != "ok" {
        return Err(AppError::Other(format!("Database integrity check failed: {}", result)));
    }

    Ok(())
}

/// Database statistics
#[derive(Debug)]
pub struct DatabaseStats {
    pub size_bytes: i64,
    pub key_count: i64,
}

pub fn get_database_stats(conn: &Connection) -> AppResult<DatabaseStats> {
    let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
    let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
    let key_count: i64 = conn.query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;

    Ok(DatabaseStats {
        size_bytes: page_count * page_size,
        key_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::create_test_connection;

    #[test]
    fn test_initialize_fresh_database() {
        let conn = create_test_connection().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);

        initialize_database(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='kv_store')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists);
    }

    #[test]
    fn test_initialize_idempotent() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        initialize_database(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        set_schema_version(&conn, CURRENT_SCHEMA_VERSION + 1).unwrap();
        assert!(initialize_database(&conn).is_err());
    }

    #[test]
    fn test_database_stats_and_integrity() {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        verify_database_integrity(&conn).unwrap();

        let stats = get_database_stats(&conn).unwrap();
        assert!(stats.size_bytes > 0);
        assert_eq!(stats.key_count, 0);
    }
}
