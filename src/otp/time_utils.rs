//! Time utilities for safe timestamp handling.
//!
//! This module provides safe alternatives to direct SystemTime operations
//! that could potentially panic.

use crate::otp::error::OtpError;
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current timestamp in seconds since Unix epoch.
///
/// In the extremely rare case where system time is before the Unix epoch,
/// this returns an error instead of panicking.
pub(crate) fn current_timestamp() -> Result<i64, OtpError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .map_err(|_| OtpError::ClockError("system time is before Unix epoch".to_string()))
}

/// Check whether a credential expiry deadline has passed.
///
/// A credential is usable strictly before its deadline: `now == expires_at`
/// already counts as expired.
pub(crate) fn is_expired(expires_at: i64, now: i64) -> bool {
    now >= expires_at
}
