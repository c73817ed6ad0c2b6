// src/db/connection.rs
//
// Database connection management
//
// PRINCIPLES:
// - Explicit connection pooling
// - No hidden connection creation
// - Clear error propagation
// - Thread-safe access

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled connection
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA busy_timeout = 5000;";

/// Default database file path
///
/// Path structure: {APP_DATA}/huevify/hub.db
pub fn get_database_path() -> AppResult<PathBuf> {
    let app_data_dir = dirs::data_dir()
        .ok_or_else(|| AppError::Other("Could not determine app data directory".to_string()))?;

    let hub_dir = app_data_dir.join("huevify");
    std::fs::create_dir_all(&hub_dir)?;

    Ok(hub_dir.join("hub.db"))
}

/// Create a connection pool on a database file
///
/// Every session of a deployment opens the same file; SQLite in WAL mode
/// gives last-writer-wins semantics across them.
pub fn create_connection_pool(db_path: &Path) -> AppResult<ConnectionPool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch(PRAGMAS));

    let pool = Pool::builder()
        .max_size(8)
        .build(manager)
        .map_err(|e| AppError::Pool(format!("Failed to create connection pool: {}", e)))?;

    log::debug!("Opened database pool at {}", db_path.display());
    Ok(pool)
}

/// Create an in-memory pool (for tests and ephemeral runs)
///
/// Each SQLite in-memory connection is its own database, so the pool
/// is capped at a single connection.
pub fn create_memory_pool() -> AppResult<ConnectionPool> {
    let manager = SqliteConnectionManager::memory();
    Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| AppError::Pool(format!("Failed to create memory pool: {}", e)))
}

/// Get a connection from the pool
///
/// This is a convenience wrapper that provides better error messages.
pub fn get_connection(pool: &ConnectionPool) -> AppResult<PooledConn> {
    pool.get()
        .map_err(|e| AppError::Pool(format!("Failed to get database connection: {}", e)))
}

/// Create a standalone in-memory connection (for testing)
pub fn create_test_connection() -> AppResult<Connection> {
    Connection::open_in_memory().map_err(AppError::Database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_pool_creation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hub.db");
        let pool = create_connection_pool(&path).unwrap();
        let conn = get_connection(&pool).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert!(path.exists());
    }

    #[test]
    fn test_memory_pool_shares_one_database() {
        let pool = create_memory_pool().unwrap();
        {
            let conn = get_connection(&pool).unwrap();
            conn.execute_batch("CREATE TABLE probe (x INTEGER)").unwrap();
        }
        let conn = get_connection(&pool).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM probe", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_test_connection() {
        let conn = create_test_connection().unwrap();
        let result: i32 = conn
            .query_row("SELECT 1 + 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(result, 2);
    }
}
