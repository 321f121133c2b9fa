//! In-memory storage backend implementation.
//!
//! This module provides a simple in-memory storage backend that uses a HashMap
//! keyed by principal. It's ideal for testing, development, and single-instance
//! applications where persistence across restarts is not required.

use super::{CredentialRecord, CredentialStore, StorageStats};
use crate::OtpError;
use crate::otp::time_utils;
use async_trait::async_trait;

/// A simple in-memory storage implementation for testing and single-instance applications.
///
/// This implementation uses a `HashMap` keyed by principal wrapped in
/// `Arc<RwLock<>>` for thread-safe access. Holding the write lock across the
/// insert makes purge-and-insert a single atomic step: inserting over an
/// existing key is exactly the supersession rule. Data does not survive
/// restarts, and expired entries linger until a sweep removes them (lookups
/// check expiry independently, so this only affects memory growth).
///
/// # Example
///
/// ```rust
/// use otp_auth::storage::{MemoryStore, CredentialStore};
///
/// # async fn example() -> Result<(), otp_auth::OtpError> {
/// let store = MemoryStore::new();
///
/// store.put_active("alice", "123456", 1_000, 1_600).await?;
/// let found = store.find_active("alice", "123456", 1_010).await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: std::sync::Arc<tokio::sync::RwLock<std::collections::HashMap<String, CredentialRecord>>>,
}

impl MemoryStore {
    /// Creates a new in-memory storage instance.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn put_active(
        &self,
        principal: &str,
        code: &str,
        created_at: i64,
        expires_at: i64,
    ) -> Result<(), OtpError> {
        let record = CredentialRecord {
            principal: principal.to_string(),
            code: code.to_string(),
            created_at,
            expires_at,
        };

        let mut data = self.data.write().await;
        // Insert over the principal key replaces any prior record in one step.
        data.insert(principal.to_string(), record);
        Ok(())
    }

    async fn find_active(
        &self,
        principal: &str,
        code: &str,
        now: i64,
    ) -> Result<Option<CredentialRecord>, OtpError> {
        let data = self.data.read().await;
        Ok(data
            .get(principal)
            .filter(|record| record.code == code && !time_utils::is_expired(record.expires_at, now))
            .cloned())
    }

    async fn delete(&self, principal: &str) -> Result<(), OtpError> {
        let mut data = self.data.write().await;
        data.remove(principal);
        Ok(())
    }

    async fn delete_expired(&self, now: i64) -> Result<usize, OtpError> {
        let mut data = self.data.write().await;
        let initial_count = data.len();
        data.retain(|_, record| record.expires_at > now);
        Ok(initial_count - data.len())
    }

    async fn get_stats(&self) -> Result<StorageStats, OtpError> {
        let data = self.data.read().await;
        let memory_usage = data.len() * std::mem::size_of::<CredentialRecord>();
        Ok(StorageStats {
            total_records: data.len(),
            backend_info: format!("In-memory HashMap storage (~{} bytes)", memory_usage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic_operations() -> Result<(), OtpError> {
        let store = MemoryStore::new();

        store.put_active("alice", "123456", 1_000, 1_600).await?;

        let record = store.find_active("alice", "123456", 1_010).await?;
        assert!(record.is_some());
        let record = record.unwrap();
        assert_eq!(record.principal, "alice");
        assert_eq!(record.code, "123456");
        assert_eq!(record.expires_at, 1_600);

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_store_wrong_code_is_none() -> Result<(), OtpError> {
        let store = MemoryStore::new();
        store.put_active("alice", "123456", 1_000, 1_600).await?;

        assert!(store.find_active("alice", "654321", 1_010).await?.is_none());
        // The record itself is untouched by the failed lookup
        assert!(store.find_active("alice", "123456", 1_010).await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_store_expired_is_none() -> Result<(), OtpError> {
        let store = MemoryStore::new();
        store.put_active("alice", "123456", 1_000, 1_600).await?;

        // Exactly at the deadline counts as expired
        assert!(store.find_active("alice", "123456", 1_600).await?.is_none());
        assert!(store.find_active("alice", "123456", 2_000).await?.is_none());

        // But the row still physically exists until a sweep
        let stats = store.get_stats().await?;
        assert_eq!(stats.total_records, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_store_put_replaces_prior_record() -> Result<(), OtpError> {
        let store = MemoryStore::new();
        store.put_active("alice", "111111", 1_000, 1_600).await?;
        store.put_active("alice", "222222", 1_100, 1_700).await?;

        // Old code is gone, new code matches, still one record
        assert!(store.find_active("alice", "111111", 1_200).await?.is_none());
        assert!(store.find_active("alice", "222222", 1_200).await?.is_some());
        assert_eq!(store.get_stats().await?.total_records, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_store_delete_idempotent() -> Result<(), OtpError> {
        let store = MemoryStore::new();
        store.put_active("alice", "123456", 1_000, 1_600).await?;

        store.delete("alice").await?;
        assert!(store.find_active("alice", "123456", 1_010).await?.is_none());

        // Deleting again (or a principal that never existed) is fine
        store.delete("alice").await?;
        store.delete("nobody").await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_store_delete_expired() -> Result<(), OtpError> {
        let store = MemoryStore::new();
        store.put_active("alice", "111111", 1_000, 1_600).await?;
        store.put_active("bob", "222222", 1_000, 2_600).await?;

        let removed = store.delete_expired(1_600).await?;
        assert_eq!(removed, 1);
        assert!(store.find_active("bob", "222222", 1_700).await?.is_some());

        // Idempotent
        assert_eq!(store.delete_expired(1_600).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_store_concurrent_put_single_record() -> Result<(), OtpError> {
        let store = std::sync::Arc::new(MemoryStore::new());
        let mut handles = vec![];

        // Many tasks race to issue for the same principal
        for i in 0..50 {
            let store_clone = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store_clone
                    .put_active("alice", &format!("{:06}", 100_000 + i), 1_000, 1_600)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap()?;
        }

        // Exactly one record survives, whichever write won
        let stats = store.get_stats().await?;
        assert_eq!(stats.total_records, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_store_stats() -> Result<(), OtpError> {
        let store = MemoryStore::new();

        let stats = store.get_stats().await?;
        assert_eq!(stats.total_records, 0);
        assert!(stats.backend_info.contains("In-memory"));

        store.put_active("alice", "123456", 1_000, 1_600).await?;
        store.put_active("bob", "654321", 1_000, 1_600).await?;

        let stats = store.get_stats().await?;
        assert_eq!(stats.total_records, 2);
        assert!(stats.backend_info.contains("bytes"));

        Ok(())
    }
}
