//! Out-of-band delivery seam.

use async_trait::async_trait;

use crate::otp::error::OtpError;

/// Delivers a generated passcode to the principal out-of-band.
///
/// The transport and message formatting belong entirely to the implementor
/// (SMS gateway, e-mail sender, push service); the manager only consumes the
/// success signal. A returned error makes the manager roll back the stored
/// credential before surfacing [`OtpError::DeliveryFailed`], so implementors
/// should only report success once the message has actually been handed off.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use otp_auth::{Notifier, OtpError};
///
/// struct StdoutNotifier;
///
/// #[async_trait]
/// impl Notifier for StdoutNotifier {
///     async fn send(&self, target: &str, principal: &str, code: &str) -> Result<(), OtpError> {
///         println!("to {target}: hi {principal}, your code is {code}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `code` to `target` on behalf of `principal`.
    ///
    /// # Arguments
    ///
    /// * `target` - Delivery address (phone number, e-mail, device token)
    /// * `principal` - Display identity for message templating
    /// * `code` - The passcode to deliver
    async fn send(&self, target: &str, principal: &str, code: &str) -> Result<(), OtpError>;
}
