use std::sync::Arc;
use std::time::Duration;

use crate::otp::config::OtpConfig;
use crate::otp::generator::{self, CodeGeneratorFn, TimeProviderFn};
use crate::otp::manager::{OtpManager, system_time_provider};
use crate::otp::notifier::Notifier;
use crate::otp::{OtpError, storage::CredentialStore};
use crate::storage::MemoryStore;

/// A builder for creating an `OtpManager` instance.
///
/// This builder defaults to using `MemoryStore` and allows for ergonomic
/// configuration of all manager parameters. The notifier is the one required
/// collaborator and is supplied up front.
#[must_use = "The builder does nothing unless `.build_and_init()` is called."]
pub struct OtpManagerBuilder<S: CredentialStore> {
    storage: Arc<S>,
    notifier: Arc<dyn Notifier>,
    config: OtpConfig,
    code_generator: CodeGeneratorFn,
    time_provider: TimeProviderFn,
}

impl OtpManagerBuilder<MemoryStore> {
    /// Creates a new builder.
    ///
    /// By default, this builder uses `MemoryStore`. Use `.with_storage()` to
    /// provide a durable storage backend.
    pub(crate) fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            storage: Arc::new(MemoryStore::new()),
            notifier,
            config: OtpConfig::default(),
            code_generator: Box::new(generator::secure_code),
            time_provider: system_time_provider(),
        }
    }
}

impl<S: CredentialStore + 'static> OtpManagerBuilder<S> {
    /// Specifies a custom storage backend to use instead of the default `MemoryStore`.
    pub fn with_storage<T: CredentialStore + 'static>(
        self,
        storage: Arc<T>,
    ) -> OtpManagerBuilder<T> {
        OtpManagerBuilder {
            storage,
            notifier: self.notifier,
            config: self.config,
            code_generator: self.code_generator,
            time_provider: self.time_provider,
        }
    }

    /// Replaces the whole configuration (e.g., from a [`crate::ConfigPreset`]).
    pub fn with_config(mut self, config: OtpConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the validity window of issued codes.
    ///
    /// If not set, defaults to 10 minutes.
    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.config.code_ttl = ttl;
        self
    }

    /// Sets the per-principal issuance cooldown.
    ///
    /// If not set, defaults to 60 seconds. A zero cooldown disables rate
    /// limiting.
    pub fn with_issue_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.issue_cooldown = cooldown;
        self
    }

    /// Sets the interval of the background expiry sweep started via
    /// `OtpManager::start_sweeper`.
    ///
    /// If not set, defaults to 60 seconds.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Sets the deadline applied to each storage and delivery call.
    ///
    /// If not set, defaults to 5 seconds.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = timeout;
        self
    }

    /// Sets a custom passcode generator function.
    ///
    /// The default generator draws 6-digit codes from the OS CSPRNG. Tests
    /// use this hook to inject deterministic codes.
    pub fn with_code_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> Result<String, OtpError> + Send + Sync + 'static,
    {
        self.code_generator = Box::new(generator);
        self
    }

    /// Sets a custom time provider function.
    ///
    /// The default provider reads the system clock. Tests use this hook to
    /// drive expiry and cooldown deterministically.
    pub fn with_time_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Result<i64, OtpError> + Send + Sync + 'static,
    {
        self.time_provider = Box::new(provider);
        self
    }

    /// Builds and initializes the `OtpManager`.
    ///
    /// This method consumes the builder and returns a fully configured
    /// manager. It automatically calls the storage backend's `init()` method.
    pub async fn build_and_init(self) -> Result<OtpManager<S>, OtpError> {
        let manager = OtpManager::new(
            self.storage,
            self.notifier,
            self.config,
            self.code_generator,
            self.time_provider,
        );
        manager.init().await?;
        Ok(manager)
    }
}
