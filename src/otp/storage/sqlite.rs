//! SQLite storage backend implementation.
//!
//! This module provides a production-ready SQLite storage backend for durable
//! credential persistence. It's ideal for single-instance applications that
//! need credentials to survive process restarts.

use super::{CredentialRecord, CredentialStore, StorageStats};
use crate::OtpError;
use async_trait::async_trait;
use rusqlite::{Connection, params};
use std::sync::{Arc, Mutex};

/// SQLite-based storage backend for durable credential persistence.
///
/// This implementation provides persistent storage using SQLite, making it
/// suitable for production use where an issued credential must survive
/// application restarts.
///
/// The `principal` column is the primary key, so the purge-and-insert rule is
/// a single upsert statement executed atomically by SQLite. The `expires_at`
/// index keeps the periodic sweep cheap.
///
/// # Example
///
/// ```rust
/// use otp_auth::storage::SqliteStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), otp_auth::OtpError> {
/// // Create SQLite storage (file-based)
/// let store = Arc::new(SqliteStore::new("otp_auth.db")?);
///
/// // Or use in-memory SQLite (for testing)
/// let memory_store = Arc::new(SqliteStore::new(":memory:")?);
/// # Ok(())
/// # }
/// ```
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create a new SQLite storage backend.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file, or ":memory:" for an
    ///   in-memory database
    pub fn new(db_path: &str) -> Result<Self, OtpError> {
        let connection = if db_path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(db_path)
        };

        let connection = connection.map_err(OtpError::from_storage_error)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Create the database schema if it doesn't exist.
    fn init_schema(&self) -> Result<(), OtpError> {
        let conn = self.connection.lock().unwrap();

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS otp_credential (
                principal TEXT PRIMARY KEY,
                code TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
            [],
        )
        .map_err(OtpError::from_storage_error)?;

        // Sweep scans by deadline
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_otp_expires_at ON otp_credential (expires_at)",
            [],
        )
        .map_err(OtpError::from_storage_error)?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn init(&self) -> Result<(), OtpError> {
        self.init_schema()
    }

    async fn put_active(
        &self,
        principal: &str,
        code: &str,
        created_at: i64,
        expires_at: i64,
    ) -> Result<(), OtpError> {
        let conn = self.connection.lock().unwrap();

        // Single-statement upsert: purge-and-insert with no window in between.
        conn.execute(
            r#"
            INSERT INTO otp_credential (principal, code, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(principal) DO UPDATE SET
                code = excluded.code,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
            "#,
            params![principal, code, created_at, expires_at],
        )
        .map_err(OtpError::from_storage_error)?;

        Ok(())
    }

    async fn find_active(
        &self,
        principal: &str,
        code: &str,
        now: i64,
    ) -> Result<Option<CredentialRecord>, OtpError> {
        let conn = self.connection.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT principal, code, created_at, expires_at FROM otp_credential \
                 WHERE principal = ?1 AND code = ?2 AND expires_at > ?3",
            )
            .map_err(OtpError::from_storage_error)?;

        let result = stmt.query_row(params![principal, code, now], |row| {
            Ok(CredentialRecord {
                principal: row.get(0)?,
                code: row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
            })
        });

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(OtpError::from_storage_error(e)),
        }
    }

    async fn delete(&self, principal: &str) -> Result<(), OtpError> {
        let conn = self.connection.lock().unwrap();

        conn.execute(
            "DELETE FROM otp_credential WHERE principal = ?1",
            params![principal],
        )
        .map_err(OtpError::from_storage_error)?;

        Ok(())
    }

    async fn delete_expired(&self, now: i64) -> Result<usize, OtpError> {
        let conn = self.connection.lock().unwrap();

        let changes = conn
            .execute(
                "DELETE FROM otp_credential WHERE expires_at <= ?1",
                params![now],
            )
            .map_err(OtpError::from_storage_error)?;

        Ok(changes)
    }

    async fn get_stats(&self) -> Result<StorageStats, OtpError> {
        let conn = self.connection.lock().unwrap();

        let count: usize = conn
            .query_row("SELECT COUNT(*) FROM otp_credential", [], |row| row.get(0))
            .map_err(OtpError::from_storage_error)?;

        // Get additional SQLite-specific stats
        let db_size: i64 = conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))
            .unwrap_or(0);

        let page_size: i64 = conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))
            .unwrap_or(4096);

        let size_bytes = db_size * page_size;

        Ok(StorageStats {
            total_records: count,
            backend_info: format!("SQLite storage ({} bytes, {} pages)", size_bytes, db_size),
        })
    }
}
