use std::time::Duration;

use thiserror::Error;

/// Error types that can occur during passcode issuance and verification.
///
/// A wrong or expired code is **not** an error: [`crate::OtpManager::verify`]
/// reports that as a normal `Ok(false)` so callers cannot distinguish the two
/// cases (and therefore cannot learn expiry timing from the response). The
/// variants here cover the remaining failure modes.
///
/// # Error Categories
///
/// - **Recoverable by waiting**: `RateLimited`
/// - **System Errors**: `StorageError`, `DeliveryFailed`, `ClockError`
#[derive(Error, Debug)]
pub enum OtpError {
    /// Issuance was requested again before the per-principal cooldown elapsed.
    ///
    /// `retry_after` is the remaining wait and is intended for a user-facing
    /// message. Only *successful* issuance arms the cooldown, so a request
    /// that failed in storage or delivery never triggers this on retry.
    #[error("rate limited; retry after {}s", retry_after.as_secs())]
    RateLimited {
        /// Remaining wait before the next issuance is allowed.
        retry_after: Duration,
    },

    /// The durable credential store could not be reached or failed mid-operation.
    ///
    /// Surfaced to the caller as "try again"; the manager never retries
    /// internally. During verification this means "verification unavailable",
    /// which is deliberately distinct from a wrong code.
    #[error("storage error: {0}")]
    StorageError(String),

    /// The code was generated and stored but could not be delivered.
    ///
    /// The manager rolls back the stored credential (durable row and session
    /// cache) before returning this, so no orphaned credential blocks a
    /// follow-up issuance.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    /// The system clock reported a time before the Unix epoch.
    #[error("clock error: {0}")]
    ClockError(String),
}

impl OtpError {
    /// Creates a `StorageError` from any displayable backend error.
    pub fn from_storage_error<E: std::fmt::Display>(error: E) -> Self {
        Self::StorageError(error.to_string())
    }

    /// Creates a `StorageError` from a message.
    pub fn from_storage_message<S: Into<String>>(message: S) -> Self {
        Self::StorageError(message.into())
    }

    /// Returns the remaining cooldown for `RateLimited`, `None` otherwise.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
