//! # OTP Auth
//!
//! A Rust library for issuing and verifying short-lived, single-use numeric
//! passcodes (OTPs) that step up authentication before a sensitive action.
//!
//! Each passcode is a 6-digit decimal code bound to a principal, delivered
//! out-of-band through a pluggable [`Notifier`], stored durably until it is
//! consumed, superseded, invalidated, or expires, and mirrored in a
//! session-local cache for fast verification.
//!
//! ## Features
//!
//! - **Single-Use Codes**: a credential verifies successfully exactly once;
//!   consumption is represented by deletion
//! - **Time-Bounded Validity**: codes expire after a fixed TTL (default 10
//!   minutes), enforced on every lookup and garbage-collected by a
//!   background sweep
//! - **Supersession**: issuing a new code atomically invalidates the prior
//!   one for that principal
//! - **Issuance Rate Limiting**: per-principal cooldown (default 60 seconds)
//!   with the remaining wait reported to the caller
//! - **Delivery Rollback**: a code that cannot be delivered is removed
//!   before the error is surfaced, so no orphaned credential remains
//! - **Pluggable Storage**: in-memory, SQLite (`sqlite-storage` feature) and
//!   Redis (`redis-storage` feature) backends
//! - **Async Support**: fully asynchronous API design
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use otp_auth::{Notifier, OtpError, OtpManager, SessionCache};
//!
//! struct PrintNotifier;
//!
//! #[async_trait]
//! impl Notifier for PrintNotifier {
//!     async fn send(&self, target: &str, _principal: &str, code: &str) -> Result<(), OtpError> {
//!         println!("would deliver {code} to {target}");
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), OtpError> {
//! let manager = OtpManager::builder(Arc::new(PrintNotifier))
//!     .build_and_init()
//!     .await?;
//!
//! // One cache per session, owned by the session
//! let mut session = SessionCache::new();
//!
//! manager.issue("alice", "+1-555-0100", &mut session).await?;
//!
//! // The principal reads the code off their phone and submits it
//! let valid = manager.verify("alice", "123456", &mut session).await?;
//! println!("code accepted: {valid}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **[`OtpManager`]**: orchestrates issue, verify, and expiry sweep
//! - **[`CredentialStore`]**: durable storage seam (the source of truth)
//! - **[`SessionCache`]**: per-session fast-path mirror, never shared
//! - **[`Notifier`]**: out-of-band delivery seam
//! - **[`OtpError`]**: typed failure modes; a wrong code is `Ok(false)`, not
//!   an error

use serde::{Deserialize, Serialize};

pub mod otp;

// Re-export commonly used types
pub use otp::storage;
pub use otp::{
    CODE_LENGTH, ConfigPreset, CredentialRecord, CredentialStore, Notifier, OtpConfig, OtpError,
    OtpManager, OtpManagerBuilder, SessionCache, SweepHandle,
};

/// Inbound request to issue a passcode for a principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRequest {
    /// The identity the code will be bound to
    pub principal: String,
    /// Where the code should be delivered (phone number, e-mail, ...)
    pub delivery_target: String,
}

/// Outcome of an issuance request in wire-friendly form.
///
/// [`IssueResponse::from_result`] maps manager errors to user-facing text.
/// Rate limiting is the only distinguishable failure and carries the wait in
/// `retry_after_seconds`; storage and delivery problems both read as "try
/// again" so infrastructure detail never leaks to the requester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueResponse {
    /// Whether a code was generated, stored, and delivered
    pub success: bool,
    /// User-facing description of the outcome
    pub message: String,
    /// Remaining cooldown when rate limited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl IssueResponse {
    /// Converts a manager issuance result into a response.
    pub fn from_result(result: &Result<(), OtpError>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                message: "verification code sent".to_string(),
                retry_after_seconds: None,
            },
            Err(OtpError::RateLimited { retry_after }) => Self {
                success: false,
                message: format!(
                    "please wait {} seconds before requesting a new code",
                    retry_after.as_secs()
                ),
                retry_after_seconds: Some(retry_after.as_secs()),
            },
            Err(_) => Self {
                success: false,
                message: "could not send a verification code, please try again".to_string(),
                retry_after_seconds: None,
            },
        }
    }
}

/// Inbound request to verify a previously issued passcode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// The identity the code was issued for
    pub principal: String,
    /// The 6-digit code as submitted by the user
    pub code: String,
}

/// Outcome of a verification request.
///
/// Wrong, expired, and already-consumed codes all yield `valid: false`; the
/// distinction is deliberately not exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Whether the code matched an active credential (and consumed it)
    pub valid: bool,
}

impl From<bool> for VerifyResponse {
    fn from(valid: bool) -> Self {
        Self { valid }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_issue_response_success() {
        let response = IssueResponse::from_result(&Ok(()));
        assert!(response.success);
        assert_eq!(response.message, "verification code sent");
        assert!(response.retry_after_seconds.is_none());
    }

    #[test]
    fn test_issue_response_rate_limited_carries_wait() {
        let response = IssueResponse::from_result(&Err(OtpError::RateLimited {
            retry_after: Duration::from_secs(50),
        }));
        assert!(!response.success);
        assert_eq!(response.retry_after_seconds, Some(50));
        assert!(response.message.contains("50 seconds"));
    }

    #[test]
    fn test_issue_response_hides_infrastructure_detail() {
        let storage = IssueResponse::from_result(&Err(OtpError::StorageError(
            "connection refused on 10.0.0.3:5432".to_string(),
        )));
        let delivery = IssueResponse::from_result(&Err(OtpError::DeliveryFailed(
            "smtp 554 relay denied".to_string(),
        )));

        // Same user-facing text for both, no backend detail
        assert_eq!(storage.message, delivery.message);
        assert!(!storage.message.contains("10.0.0.3"));
        assert!(!delivery.message.contains("smtp"));
    }

    #[test]
    fn test_serialization_round_trip() {
        let request = IssueRequest {
            principal: "alice".to_string(),
            delivery_target: "+15550100".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        let parsed: IssueRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.principal, "alice");
        assert_eq!(parsed.delivery_target, "+15550100");

        let response = VerifyResponse::from(true);
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"valid":true}"#);
    }

    #[test]
    fn test_retry_after_omitted_from_json_when_absent() {
        let response = IssueResponse::from_result(&Ok(()));
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("retry_after_seconds"));
    }
}
