use std::time::Duration;

/// Predefined configuration presets for common use cases.
///
/// These presets provide sensible defaults for different deployment scenarios,
/// balancing security, usability, and performance requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Production-ready configuration.
    ///
    /// Balanced security and usability:
    /// - Code TTL: 10 minutes
    /// - Issue cooldown: 60 seconds
    /// - Sweep interval: 60 seconds
    Production,

    /// Development-friendly configuration.
    ///
    /// Relaxed settings for easier testing and debugging:
    /// - Code TTL: 30 minutes
    /// - Issue cooldown: 10 seconds
    /// - Sweep interval: 5 minutes
    Development,

    /// High-security configuration.
    ///
    /// Maximum security with strict timing requirements:
    /// - Code TTL: 2 minutes
    /// - Issue cooldown: 2 minutes
    /// - Sweep interval: 30 seconds
    HighSecurity,

    /// Load configuration from environment variables.
    ///
    /// Reads configuration from:
    /// - `OTP_AUTH_CODE_TTL`: Code TTL in seconds (default: 600)
    /// - `OTP_AUTH_ISSUE_COOLDOWN`: Issuance cooldown in seconds (default: 60)
    /// - `OTP_AUTH_SWEEP_INTERVAL`: Expiry sweep interval in seconds (default: 60)
    /// - `OTP_AUTH_OPERATION_TIMEOUT`: Per-operation deadline in seconds (default: 5)
    FromEnv,
}

/// Configuration for the passcode manager.
///
/// # Example
///
/// ```rust
/// use otp_auth::OtpConfig;
/// use std::time::Duration;
///
/// // Use default configuration
/// let config = OtpConfig::default();
///
/// // Create custom configuration
/// let config = OtpConfig {
///     code_ttl: Duration::from_secs(300),
///     issue_cooldown: Duration::from_secs(30),
///     ..OtpConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// Validity window of an issued code, from issuance to expiry
    pub code_ttl: Duration,
    /// Minimum interval between successful issuances per principal
    pub issue_cooldown: Duration,
    /// Interval of the background expiry sweep
    pub sweep_interval: Duration,
    /// Deadline applied to each storage and delivery call
    pub operation_timeout: Duration,
}

fn env_secs(var: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(var)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default),
    )
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_ttl: env_secs("OTP_AUTH_CODE_TTL", 600),
            issue_cooldown: env_secs("OTP_AUTH_ISSUE_COOLDOWN", 60),
            sweep_interval: env_secs("OTP_AUTH_SWEEP_INTERVAL", 60),
            operation_timeout: env_secs("OTP_AUTH_OPERATION_TIMEOUT", 5),
        }
    }
}

impl OtpConfig {
    /// Validates the configuration and returns any warnings.
    ///
    /// # Returns
    ///
    /// A vector of warning messages for potentially problematic settings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.code_ttl.as_secs() < 60 {
            warnings
                .push("Very short code TTL (< 1 minute) may cause usability issues".to_string());
        }
        if self.code_ttl.as_secs() > 3600 {
            warnings.push("Long code TTL (> 1 hour) may increase security risk".to_string());
        }

        if self.issue_cooldown.is_zero() {
            warnings.push("Zero issue cooldown disables rate limiting".to_string());
        }
        if self.issue_cooldown > self.code_ttl {
            warnings.push(
                "Issue cooldown longer than code TTL leaves windows with no requestable code"
                    .to_string(),
            );
        }

        if self.sweep_interval.is_zero() {
            warnings.push("Zero sweep interval makes the sweeper spin".to_string());
        }
        if self.sweep_interval > self.code_ttl.saturating_mul(10) {
            warnings.push(
                "Sweep interval far above the code TTL lets expired records pile up".to_string(),
            );
        }

        if self.operation_timeout.as_secs() > 30 {
            warnings.push(
                "Long operation timeout (> 30 seconds) stalls callers on storage outages"
                    .to_string(),
            );
        }

        warnings
    }

    /// Returns a summary of the current configuration.
    pub fn summary(&self) -> String {
        format!(
            "OtpConfig {{ Code TTL: {}s, Issue cooldown: {}s, Sweep interval: {}s, Operation timeout: {}s }}",
            self.code_ttl.as_secs(),
            self.issue_cooldown.as_secs(),
            self.sweep_interval.as_secs(),
            self.operation_timeout.as_secs(),
        )
    }
}

impl From<ConfigPreset> for OtpConfig {
    fn from(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Production => Self {
                code_ttl: Duration::from_secs(600),
                issue_cooldown: Duration::from_secs(60),
                sweep_interval: Duration::from_secs(60),
                operation_timeout: Duration::from_secs(5),
            },
            ConfigPreset::Development => Self {
                code_ttl: Duration::from_secs(1800),
                issue_cooldown: Duration::from_secs(10),
                sweep_interval: Duration::from_secs(300),
                operation_timeout: Duration::from_secs(10),
            },
            ConfigPreset::HighSecurity => Self {
                code_ttl: Duration::from_secs(120),
                issue_cooldown: Duration::from_secs(120),
                sweep_interval: Duration::from_secs(30),
                operation_timeout: Duration::from_secs(5),
            },
            ConfigPreset::FromEnv => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_preset() {
        let config = OtpConfig::from(ConfigPreset::Production);
        assert_eq!(config.code_ttl.as_secs(), 600);
        assert_eq!(config.issue_cooldown.as_secs(), 60);
        assert_eq!(config.sweep_interval.as_secs(), 60);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_development_preset() {
        let config = OtpConfig::from(ConfigPreset::Development);
        assert_eq!(config.code_ttl.as_secs(), 1800);
        assert_eq!(config.issue_cooldown.as_secs(), 10);
    }

    #[test]
    fn test_high_security_preset() {
        let config = OtpConfig::from(ConfigPreset::HighSecurity);
        assert_eq!(config.code_ttl.as_secs(), 120);
        assert_eq!(config.issue_cooldown.as_secs(), 120);
    }

    #[test]
    fn test_from_env() {
        unsafe {
            std::env::set_var("OTP_AUTH_CODE_TTL", "900");
            std::env::set_var("OTP_AUTH_ISSUE_COOLDOWN", "30");
        }

        let config = OtpConfig::from(ConfigPreset::FromEnv);
        assert_eq!(config.code_ttl.as_secs(), 900);
        assert_eq!(config.issue_cooldown.as_secs(), 30);
        // Unset vars fall back to defaults
        assert_eq!(config.operation_timeout.as_secs(), 5);

        unsafe {
            std::env::remove_var("OTP_AUTH_CODE_TTL");
            std::env::remove_var("OTP_AUTH_ISSUE_COOLDOWN");
        }
    }

    #[test]
    fn test_validation_ttl_warnings() {
        let config = OtpConfig {
            code_ttl: Duration::from_secs(30),
            ..OtpConfig::from(ConfigPreset::Production)
        };
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("Very short code TTL")));

        let config = OtpConfig {
            code_ttl: Duration::from_secs(7200),
            ..OtpConfig::from(ConfigPreset::Production)
        };
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("Long code TTL")));
    }

    #[test]
    fn test_validation_cooldown_warnings() {
        let config = OtpConfig {
            issue_cooldown: Duration::ZERO,
            ..OtpConfig::from(ConfigPreset::Production)
        };
        assert!(
            config
                .validate()
                .iter()
                .any(|w| w.contains("disables rate limiting"))
        );

        let config = OtpConfig {
            code_ttl: Duration::from_secs(120),
            issue_cooldown: Duration::from_secs(300),
            ..OtpConfig::from(ConfigPreset::Production)
        };
        assert!(
            config
                .validate()
                .iter()
                .any(|w| w.contains("cooldown longer than code TTL"))
        );
    }

    #[test]
    fn test_summary() {
        let summary = OtpConfig::from(ConfigPreset::Production).summary();
        assert!(summary.contains("Code TTL: 600s"));
        assert!(summary.contains("Issue cooldown: 60s"));
    }
}
