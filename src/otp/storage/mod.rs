//! Pluggable storage backends for durable credential persistence.
//!
//! This module provides a trait-based storage system that allows different
//! backends to be used for credential persistence. The available backends
//! depend on the enabled features. The durable store is the single source of
//! truth for verification; the per-session cache in [`crate::SessionCache`]
//! is only a latency optimization layered on top of it.

use crate::OtpError;
use async_trait::async_trait;

// Always available
mod memory;
pub use memory::MemoryStore;

// Feature-gated storage backends
#[cfg(feature = "sqlite-storage")]
mod sqlite;
#[cfg(feature = "sqlite-storage")]
pub use sqlite::SqliteStore;

#[cfg(feature = "redis-storage")]
mod redis;
#[cfg(feature = "redis-storage")]
pub use redis::RedisStore;

/// A durable credential record.
///
/// At most one record exists per principal at any instant; consumption is
/// represented by the record's absence, not a flag.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    /// The principal (e.g., username) the code is bound to
    pub principal: String,
    /// Fixed-width 6-digit decimal passcode
    pub code: String,
    /// Unix timestamp when the credential was issued
    pub created_at: i64,
    /// Unix timestamp after which the credential is no longer usable
    pub expires_at: i64,
}

/// Statistics about the credential storage backend.
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Total number of credential records in storage (including expired
    /// records the sweep has not yet removed)
    pub total_records: usize,
    /// Additional backend-specific information
    pub backend_info: String,
}

/// Abstract storage backend for durable credential persistence.
///
/// This trait defines the interface that all storage backends must implement
/// to work with the passcode manager. A record's absence is a normal outcome
/// for lookups, never an error.
///
/// # Available Implementations
///
/// - [`MemoryStore`] - Always available, in-memory HashMap-based storage
/// - `SqliteStore` - Available with `sqlite-storage` feature, persistent SQLite storage
/// - `RedisStore` - Available with `redis-storage` feature, distributed Redis storage
///
/// # Atomicity
///
/// [`put_active`](CredentialStore::put_active) must behave as a single atomic
/// unit per principal: a concurrent issuance for the same principal must
/// never leave two active records, and must never remove a record another
/// request just inserted without replacing it. Backends achieve this with a
/// write lock, an upsert statement, or an atomic key overwrite.
///
/// # Thread Safety
///
/// All methods are async and must be thread-safe. Implementations should
/// handle concurrent access properly.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Optional method for storage backend initialization.
    ///
    /// Called once when the backend is first used; implementations can use
    /// this for schema creation, connection setup, etc.
    async fn init(&self) -> Result<(), OtpError> {
        // Default implementation does nothing
        Ok(())
    }

    /// Atomically removes any existing record for `principal` and inserts the
    /// new one (the supersession rule).
    ///
    /// There must be no observable instant between the purge and the insert
    /// in which the principal has no record; a concurrent verification sees
    /// either the old record or the new one.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the record was stored
    /// * `Err(OtpError::StorageError)` - If the backend is unreachable; the
    ///   caller must not proceed to deliver the code
    async fn put_active(
        &self,
        principal: &str,
        code: &str,
        created_at: i64,
        expires_at: i64,
    ) -> Result<(), OtpError>;

    /// Returns the record for `principal` only if `code` matches the stored
    /// value and `now` is before its expiry.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - Matching, unexpired credential
    /// * `Ok(None)` - No record, wrong code, or expired (a normal outcome)
    /// * `Err(OtpError)` - Backend failure
    async fn find_active(
        &self,
        principal: &str,
        code: &str,
        now: i64,
    ) -> Result<Option<CredentialRecord>, OtpError>;

    /// Removes the record for `principal` unconditionally.
    ///
    /// Idempotent: deleting a non-existent record is not an error.
    async fn delete(&self, principal: &str) -> Result<(), OtpError>;

    /// Removes all records with `expires_at <= now`.
    ///
    /// Idempotent and safe to call concurrently with other operations.
    ///
    /// # Returns
    ///
    /// * `Ok(count)` - Number of records that were removed
    async fn delete_expired(&self, now: i64) -> Result<usize, OtpError>;

    /// Returns statistics about the storage backend.
    async fn get_stats(&self) -> Result<StorageStats, OtpError>;
}
