//! Secure generation of fixed-width numeric passcodes.

use rand::Rng;
use rand::rngs::OsRng;

use crate::otp::error::OtpError;

/// Number of decimal digits in a generated passcode.
pub const CODE_LENGTH: usize = 6;

/// A function that produces passcodes.
///
/// The manager uses [`secure_code`] by default; tests inject deterministic
/// generators through `OtpManagerBuilder::with_code_generator`.
pub type CodeGeneratorFn = Box<dyn Fn() -> Result<String, OtpError> + Send + Sync>;

/// A function that provides the current Unix timestamp in seconds.
///
/// The default provider reads the system clock; tests inject a controllable
/// clock through `OtpManagerBuilder::with_time_provider`.
pub type TimeProviderFn = Box<dyn Fn() -> Result<i64, OtpError> + Send + Sync>;

/// Generates a 6-digit passcode from the operating system CSPRNG.
///
/// Codes are drawn uniformly from `[100000, 999999]`. Leading-zero codes are
/// excluded by construction so the string form is always exactly six digits
/// and cannot be misread as a shorter number. The output carries no
/// relationship to time or principal.
pub fn secure_code() -> Result<String, OtpError> {
    let mut rng = OsRng;
    let value: u32 = rng.gen_range(100_000..=999_999);
    Ok(value.to_string())
}
