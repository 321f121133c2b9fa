//! Per-principal issuance rate limiting.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::otp::error::OtpError;

/// Enforces a minimum interval between successive issuances per principal.
///
/// Tracks the timestamp of the last *successful* issuance for each principal.
/// The caller records that timestamp only once issuance has fully succeeded
/// (storage and delivery), so a failed attempt never consumes the cooldown
/// window.
///
/// The scope is per principal across all sessions of one manager instance,
/// the stricter of the two plausible interpretations; it is not persisted, so
/// a restart resets the windows.
#[derive(Debug)]
pub struct RateLimiter {
    cooldown: Duration,
    last_issued: RwLock<HashMap<String, i64>>,
}

impl RateLimiter {
    /// Creates a rate limiter with the given cooldown.
    ///
    /// A zero cooldown disables limiting.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_issued: RwLock::new(HashMap::new()),
        }
    }

    /// Checks whether an issuance for `principal` is currently allowed.
    ///
    /// Returns `Err(OtpError::RateLimited)` with the remaining wait when the
    /// previous successful issuance is still inside the cooldown window. This
    /// does not itself arm the window; call [`record`](Self::record) for that.
    pub async fn check(&self, principal: &str, now: i64) -> Result<(), OtpError> {
        let last_issued = self.last_issued.read().await;
        if let Some(&last) = last_issued.get(principal) {
            let elapsed = now.saturating_sub(last);
            let cooldown = self.cooldown.as_secs() as i64;
            if elapsed < cooldown {
                return Err(OtpError::RateLimited {
                    retry_after: Duration::from_secs((cooldown - elapsed) as u64),
                });
            }
        }
        Ok(())
    }

    /// Records a successful issuance for `principal` at `now`.
    ///
    /// Stamps that have aged out of the cooldown window can never deny a
    /// request again, so they are dropped here; the map holds only principals
    /// inside an active cooldown.
    pub async fn record(&self, principal: &str, now: i64) {
        let cooldown = self.cooldown.as_secs() as i64;
        let mut last_issued = self.last_issued.write().await;
        last_issued.insert(principal.to_string(), now);
        last_issued.retain(|_, &mut last| now.saturating_sub(last) < cooldown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_allowed() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        assert!(limiter.check("alice", 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_denied_inside_cooldown_with_remaining_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        limiter.record("alice", 0).await;

        let err = limiter.check("alice", 10).await.unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(50)));
    }

    #[tokio::test]
    async fn test_allowed_once_cooldown_elapsed() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        limiter.record("alice", 0).await;

        assert!(limiter.check("alice", 59).await.is_err());
        assert!(limiter.check("alice", 60).await.is_ok());
        assert!(limiter.check("alice", 61).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_does_not_arm_the_window() {
        let limiter = RateLimiter::new(Duration::from_secs(60));

        // Checking repeatedly without recording never denies
        assert!(limiter.check("alice", 0).await.is_ok());
        assert!(limiter.check("alice", 1).await.is_ok());
        assert!(limiter.check("alice", 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_principals_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        limiter.record("alice", 0).await;

        assert!(limiter.check("alice", 10).await.is_err());
        assert!(limiter.check("bob", 10).await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_cooldown_disables_limiting() {
        let limiter = RateLimiter::new(Duration::ZERO);
        limiter.record("alice", 5).await;
        assert!(limiter.check("alice", 5).await.is_ok());
    }

    #[tokio::test]
    async fn test_record_drops_stamps_outside_the_window() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        limiter.record("alice", 0).await;
        limiter.record("bob", 10).await;

        // By t=100 both earlier windows have elapsed
        limiter.record("carol", 100).await;

        let stamps = limiter.last_issued.read().await;
        assert!(!stamps.contains_key("alice"));
        assert!(!stamps.contains_key("bob"));
        assert!(stamps.contains_key("carol"));
    }

    #[tokio::test]
    async fn test_clock_regression_does_not_underflow() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        limiter.record("alice", 100).await;

        // now < last: still inside the window, wait capped at the cooldown
        let err = limiter.check("alice", 50).await.unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
    }
}
