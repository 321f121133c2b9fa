//! Per-session fast-path mirror of the most recently issued credential.

use crate::otp::error::OtpError;
use crate::otp::storage::CredentialStore;
use crate::otp::time_utils;

/// The cached copy of one issued credential.
#[derive(Debug, Clone)]
struct CachedCredential {
    principal: String,
    code: String,
    expires_at: i64,
}

/// A session-scoped cache holding at most the last credential issued in that
/// session.
///
/// Each session owns exactly one `SessionCache` and passes it `&mut` into the
/// manager per request; it is never shared across sessions or principals and
/// carries no cross-process consistency requirement. The durable store stays
/// authoritative: a cold or missing cache changes verification latency, never
/// its outcome.
///
/// A new issuance for the same session overwrites the entry, so staleness
/// relative to the durable store is transient.
#[derive(Debug, Default)]
pub struct SessionCache {
    entry: Option<CachedCredential>,
}

impl SessionCache {
    /// Creates an empty session cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrors a freshly issued credential, overwriting any prior entry.
    pub fn put(&mut self, principal: &str, code: &str, expires_at: i64) {
        self.entry = Some(CachedCredential {
            principal: principal.to_string(),
            code: code.to_string(),
            expires_at,
        });
    }

    /// Fast-path consumption attempt.
    ///
    /// On a match (same principal, same code, not yet expired) the durable
    /// store is asked to confirm the credential is still active, the record is
    /// deleted from both locations, and `Ok(true)` is returned.
    ///
    /// The confirmation matters: the entry can be stale when another session
    /// already consumed the credential or a newer issuance superseded it. In
    /// that case the stale entry is dropped and `Ok(false)` is returned
    /// without touching the store, so a superseding credential is never
    /// deleted by accident.
    ///
    /// On a plain miss the entry is left untouched and `Ok(false)` is
    /// returned; the caller falls through to the durable store.
    pub async fn try_consume<S: CredentialStore + ?Sized>(
        &mut self,
        store: &S,
        principal: &str,
        code: &str,
        now: i64,
    ) -> Result<bool, OtpError> {
        let matched = self
            .entry
            .as_ref()
            .is_some_and(|e| {
                e.principal == principal
                    && e.code == code
                    && !time_utils::is_expired(e.expires_at, now)
            });

        if !matched {
            return Ok(false);
        }

        if store.find_active(principal, code, now).await?.is_none() {
            self.entry = None;
            return Ok(false);
        }

        self.entry = None;
        store.delete(principal).await?;
        Ok(true)
    }

    /// Drops the entry unconditionally (explicit invalidation or logout).
    pub fn clear(&mut self) {
        self.entry = None;
    }

    /// Whether the cache currently holds an entry.
    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}
