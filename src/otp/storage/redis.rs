//! Redis storage backend implementation.
//!
//! This module provides a Redis-based storage backend for durable credential
//! persistence. It's ideal for deployments where several manager instances
//! share the same credential state.

use super::{CredentialRecord, CredentialStore, StorageStats};
use crate::OtpError;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Redis-based storage backend for durable credential persistence.
///
/// Each principal maps to exactly one key (`prefix:principal`), so a plain
/// `SET` is the atomic purge-and-insert: the new credential overwrites any
/// prior one in a single command. Keys carry a Redis TTL matching the
/// credential expiry, so Redis removes most expired records on its own;
/// [`delete_expired`](CredentialStore::delete_expired) additionally purges
/// records by their stored deadline for backends/configurations where the key
/// TTL lags.
///
/// # Example
///
/// ```rust
/// use otp_auth::storage::RedisStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), otp_auth::OtpError> {
/// let store = Arc::new(RedisStore::new("redis://localhost:6379", "otp_auth")?);
/// # Ok(())
/// # }
/// ```
pub struct RedisStore {
    client: Client,
    key_prefix: String,
    /// Shared persistent connection for better performance
    conn: Arc<Mutex<Option<MultiplexedConnection>>>,
}

impl RedisStore {
    /// Create a new Redis storage backend.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `key_prefix` - Prefix for all credential keys to avoid collisions
    pub fn new(redis_url: &str, key_prefix: &str) -> Result<Self, OtpError> {
        let client = Client::open(redis_url)
            .map_err(|e| OtpError::from_storage_message(format!("Redis client error: {}", e)))?;

        Ok(Self {
            client,
            key_prefix: key_prefix.to_string(),
            conn: Arc::new(Mutex::new(None)),
        })
    }

    /// Get or create a persistent connection
    async fn get_connection(&self) -> Result<MultiplexedConnection, OtpError> {
        let mut conn_guard = self.conn.lock().await;

        // Check if we have an existing connection
        if let Some(conn) = conn_guard.as_ref() {
            // Test if connection is still alive
            let mut test_conn = conn.clone();
            match redis::cmd("PING")
                .query_async::<_, String>(&mut test_conn)
                .await
            {
                Ok(_) => return Ok(conn.clone()),
                Err(_) => {
                    // Connection is dead, remove it
                    *conn_guard = None;
                }
            }
        }

        // Create new connection
        let new_conn = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| {
                OtpError::from_storage_message(format!("Redis connection failed: {}", e))
            })?;

        *conn_guard = Some(new_conn.clone());
        Ok(new_conn)
    }

    /// Create the Redis key for a principal.
    fn make_key(&self, principal: &str) -> String {
        let mut key = String::with_capacity(self.key_prefix.len() + principal.len() + 1);
        key.push_str(&self.key_prefix);
        key.push(':');
        key.push_str(principal);
        key
    }

    /// Parse a credential record from a Redis key/value pair.
    ///
    /// The value format is `code:created_at:expires_at`.
    fn parse_record(&self, key: &str, value: &str) -> Result<CredentialRecord, OtpError> {
        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() != 3 {
            return Err(OtpError::from_storage_message("Invalid Redis value format"));
        }

        let created_at: i64 = parts[1]
            .parse()
            .map_err(|_| OtpError::from_storage_message("Invalid created_at in Redis value"))?;
        let expires_at: i64 = parts[2]
            .parse()
            .map_err(|_| OtpError::from_storage_message("Invalid expires_at in Redis value"))?;

        // Principal is everything after the prefix
        let principal = key
            .strip_prefix(&self.key_prefix)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| OtpError::from_storage_message("Invalid Redis key format"))?;

        Ok(CredentialRecord {
            principal: principal.to_string(),
            code: parts[0].to_string(),
            created_at,
            expires_at,
        })
    }

    /// Scan keys with pattern using SCAN instead of KEYS for production safety
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, OtpError> {
        let mut conn = self.get_connection().await?;
        let mut keys = Vec::new();
        let mut cursor = 0u64;

        loop {
            let (new_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100) // Process 100 keys at a time
                .query_async(&mut conn)
                .await
                .map_err(OtpError::from_storage_error)?;

            keys.extend(batch);
            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn init(&self) -> Result<(), OtpError> {
        // Initialize connection and test Redis
        let mut conn = self.get_connection().await?;

        // Verify Redis is accessible with a ping
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| OtpError::from_storage_message(format!("Redis ping failed: {}", e)))?;

        Ok(())
    }

    async fn put_active(
        &self,
        principal: &str,
        code: &str,
        created_at: i64,
        expires_at: i64,
    ) -> Result<(), OtpError> {
        let mut conn = self.get_connection().await?;
        let key = self.make_key(principal);

        let value = format!("{}:{}:{}", code, created_at, expires_at);
        // Redis requires TTL in seconds, minimum 1 second
        let ttl_secs = (expires_at - created_at).max(1) as u64;

        // Plain SET overwrites any prior credential for this principal
        // atomically, which is exactly the supersession rule.
        let _: () = conn
            .set_options(
                &key,
                &value,
                redis::SetOptions::default()
                    .with_expiration(redis::SetExpiry::EX(ttl_secs as usize)),
            )
            .await
            .map_err(OtpError::from_storage_error)?;

        Ok(())
    }

    async fn find_active(
        &self,
        principal: &str,
        code: &str,
        now: i64,
    ) -> Result<Option<CredentialRecord>, OtpError> {
        let mut conn = self.get_connection().await?;
        let key = self.make_key(principal);

        let value: Option<String> = conn
            .get(&key)
            .await
            .map_err(OtpError::from_storage_error)?;

        match value {
            Some(val) => {
                let record = self.parse_record(&key, &val)?;
                if record.code == code && now < record.expires_at {
                    Ok(Some(record))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, principal: &str) -> Result<(), OtpError> {
        let mut conn = self.get_connection().await?;
        let key = self.make_key(principal);

        // DEL on a missing key is a no-op, which keeps delete idempotent
        let _: usize = conn
            .del(&key)
            .await
            .map_err(OtpError::from_storage_error)?;

        Ok(())
    }

    async fn delete_expired(&self, now: i64) -> Result<usize, OtpError> {
        let mut conn = self.get_connection().await?;

        // Use SCAN instead of KEYS for production safety
        let pattern = format!("{}:*", self.key_prefix);
        let keys = self.scan_keys(&pattern).await?;

        let mut deleted_count = 0;
        let mut to_delete = Vec::new();

        // Batch get values to check expiration
        for chunk in keys.chunks(100) {
            let values: Vec<Option<String>> = redis::cmd("MGET")
                .arg(chunk)
                .query_async(&mut conn)
                .await
                .map_err(OtpError::from_storage_error)?;

            for (key, value) in chunk.iter().zip(values.iter()) {
                if let Some(val) = value {
                    if let Ok(record) = self.parse_record(key, val) {
                        if record.expires_at <= now {
                            to_delete.push(key.clone());
                        }
                    }
                }
            }
        }

        // Batch delete expired keys
        for chunk in to_delete.chunks(100) {
            if !chunk.is_empty() {
                let deleted: usize = conn
                    .del(chunk)
                    .await
                    .map_err(OtpError::from_storage_error)?;
                deleted_count += deleted;
            }
        }

        Ok(deleted_count)
    }

    async fn get_stats(&self) -> Result<StorageStats, OtpError> {
        let mut conn = self.get_connection().await?;

        // Count keys using SCAN instead of KEYS
        let pattern = format!("{}:*", self.key_prefix);
        let keys = self.scan_keys(&pattern).await?;
        let total_records = keys.len();

        // Get Redis server info for additional stats
        let info: String = redis::cmd("INFO")
            .arg("memory")
            .query_async(&mut conn)
            .await
            .map_err(OtpError::from_storage_error)?;

        // Extract memory usage from info string
        let memory_usage = info
            .lines()
            .find(|line| line.starts_with("used_memory_human:"))
            .map(|line| line.split(':').nth(1).unwrap_or("unknown").trim())
            .unwrap_or("unknown");

        Ok(StorageStats {
            total_records,
            backend_info: format!(
                "Redis storage (memory: {}, prefix: {}, persistent conn)",
                memory_usage, self.key_prefix
            ),
        })
    }
}
