use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::cache::SessionCache;
use super::config::OtpConfig;
use super::error::OtpError;
use super::generator::{CodeGeneratorFn, TimeProviderFn};
use super::notifier::Notifier;
use super::rate_limit::RateLimiter;
use super::storage::{CredentialStore, StorageStats};
use super::sweep::SweepHandle;
use super::{manager_builder::OtpManagerBuilder, sweep, time_utils};
use crate::storage::MemoryStore;

/// Orchestrates the passcode lifecycle: issue, verify, expire, invalidate.
///
/// The manager is safe to share (`Arc`) across many concurrent request
/// handlers. Requests for the same principal are serialized by a keyed lock,
/// so issuance never races another issuance or a verification for that
/// principal into an inconsistent state; different principals never contend.
///
/// To create an instance, use the `OtpManager::builder()` method.
pub struct OtpManager<S: CredentialStore> {
    pub(crate) storage: Arc<S>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) config: OtpConfig,
    pub(crate) rate_limiter: RateLimiter,
    pub(crate) code_generator: CodeGeneratorFn,
    pub(crate) time_provider: TimeProviderFn,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OtpManager<MemoryStore> {
    /// Creates a new `OtpManagerBuilder` to construct an `OtpManager`.
    ///
    /// The builder defaults to using `MemoryStore`. Provide a durable storage
    /// backend using the `.with_storage()` method on the builder.
    pub fn builder(notifier: Arc<dyn Notifier>) -> OtpManagerBuilder<MemoryStore> {
        OtpManagerBuilder::new(notifier)
    }
}

impl<S: CredentialStore + 'static> OtpManager<S> {
    /// Internal constructor used by the builder.
    pub(crate) fn new(
        storage: Arc<S>,
        notifier: Arc<dyn Notifier>,
        config: OtpConfig,
        code_generator: CodeGeneratorFn,
        time_provider: TimeProviderFn,
    ) -> Self {
        let rate_limiter = RateLimiter::new(config.issue_cooldown);
        Self {
            storage,
            notifier,
            config,
            rate_limiter,
            code_generator,
            time_provider,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Initializes the storage backend (e.g., creates database tables).
    pub(crate) async fn init(&self) -> Result<(), OtpError> {
        self.storage.init().await
    }

    /// Issues a fresh passcode for `principal` and delivers it to
    /// `delivery_target`.
    ///
    /// On success the new credential supersedes any active one for the
    /// principal, the session cache mirrors it, and the cooldown window is
    /// armed. Failure modes, in order of checking:
    ///
    /// - [`OtpError::RateLimited`] - cooldown still running; nothing changed
    /// - [`OtpError::StorageError`] - durable store unreachable or timed out;
    ///   the code is not delivered
    /// - [`OtpError::DeliveryFailed`] - the stored credential has been rolled
    ///   back (durable row deleted, cache cleared) before this is returned,
    ///   and the cooldown is *not* armed, so the caller may retry immediately
    pub async fn issue(
        &self,
        principal: &str,
        delivery_target: &str,
        cache: &mut SessionCache,
    ) -> Result<(), OtpError> {
        let lock = self.principal_lock(principal).await;
        let _guard = lock.lock().await;

        let now = (self.time_provider)()?;
        self.rate_limiter.check(principal, now).await?;

        let code = (self.code_generator)()?;
        let expires_at = now + self.config.code_ttl.as_secs() as i64;

        self.bounded(self.storage.put_active(principal, &code, now, expires_at))
            .await?;
        cache.put(principal, &code, expires_at);

        if let Err(e) = self.deliver(delivery_target, principal, &code).await {
            // Undeliverable credentials must not linger: they would block the
            // next issuance via the purge-on-insert rule without ever being
            // usable.
            if let Err(rollback_err) = self.bounded(self.storage.delete(principal)).await {
                tracing::warn!(
                    principal,
                    error = %rollback_err,
                    "failed to roll back credential after delivery failure"
                );
            }
            cache.clear();
            return Err(e);
        }

        self.rate_limiter.record(principal, now).await;
        Ok(())
    }

    /// Verifies `code` for `principal`, consuming the credential on success.
    ///
    /// The session cache is tried first; on a cache miss the durable store
    /// decides. A matching, unexpired credential is deleted from both
    /// locations and `Ok(true)` is returned — exactly once per credential,
    /// also under concurrent verification attempts.
    ///
    /// `Ok(false)` covers wrong code, expired code, and already-consumed code
    /// alike, and never deletes or modifies a still-valid credential: the
    /// correct code remains usable after any number of wrong attempts until
    /// expiry. Storage failures surface as [`OtpError::StorageError`]
    /// ("verification unavailable"), never as a false verdict.
    pub async fn verify(
        &self,
        principal: &str,
        code: &str,
        cache: &mut SessionCache,
    ) -> Result<bool, OtpError> {
        let lock = self.principal_lock(principal).await;
        let _guard = lock.lock().await;

        let now = (self.time_provider)()?;

        // Fast path: the session that requested the code usually verifies it.
        // The cache confirms with the durable store, so this await is a
        // storage call and carries the same deadline as the slow path.
        if self
            .bounded(cache.try_consume(&*self.storage, principal, code, now))
            .await?
        {
            return Ok(true);
        }

        let found = self
            .bounded(self.storage.find_active(principal, code, now))
            .await?;
        if found.is_some() {
            self.bounded(self.storage.delete(principal)).await?;
            cache.clear();
            return Ok(true);
        }

        Ok(false)
    }

    /// Runs one expiry sweep pass, removing durable records whose deadline
    /// has passed.
    ///
    /// Pure garbage collection: verification checks expiry independently, so
    /// this only bounds storage growth.
    ///
    /// # Returns
    ///
    /// The number of records removed.
    pub async fn sweep_expired(&self) -> Result<usize, OtpError> {
        let now = (self.time_provider)()?;
        self.storage.delete_expired(now).await
    }

    /// Spawns the periodic background expiry sweep.
    ///
    /// The task runs every `config.sweep_interval` until the returned handle
    /// is shut down or dropped. Individual failed passes are logged and do
    /// not stop the task.
    pub fn start_sweeper(&self) -> SweepHandle {
        sweep::spawn(Arc::clone(&self.storage), self.config.sweep_interval)
    }

    /// Returns statistics about the durable storage backend.
    pub async fn storage_stats(&self) -> Result<StorageStats, OtpError> {
        self.storage.get_stats().await
    }

    /// Returns a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Returns the manager configuration.
    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Returns the serialization lock for `principal`, creating it on first use.
    ///
    /// Entries no in-flight request holds are dropped on each lookup, so the
    /// map tracks active principals only and stays bounded over time.
    async fn principal_lock(&self, principal: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(
            locks
                .entry(principal.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Applies the operation deadline to a storage call.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, OtpError>
    where
        F: Future<Output = Result<T, OtpError>>,
    {
        match tokio::time::timeout(self.config.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(OtpError::from_storage_message("operation timed out")),
        }
    }

    /// Applies the operation deadline to the delivery call.
    async fn deliver(&self, target: &str, principal: &str, code: &str) -> Result<(), OtpError> {
        match tokio::time::timeout(
            self.config.operation_timeout,
            self.notifier.send(target, principal, code),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(OtpError::DeliveryFailed("delivery timed out".to_string())),
        }
    }
}

/// Default time provider reading the system clock.
pub(crate) fn system_time_provider() -> TimeProviderFn {
    Box::new(time_utils::current_timestamp)
}
