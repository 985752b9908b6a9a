//! # Configuration Management
//!
//! Centralized configuration for token issuing and verification.
//!
//! This module provides structured configuration for the issuer and verifier
//! services and for logging, plus the fixed constants of the wire format.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! Secrets are never part of this configuration. They are handed to
//! [`TokenIssuer`](crate::service::issuer::TokenIssuer) and
//! [`TokenVerifier`](crate::service::verifier::TokenVerifier) directly.

use crate::error::{TokenError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Version byte of the V1 wire format
pub const TOKEN_VERSION_V1: u8 = 1;

/// Size of the HMAC-SHA256 signature in bytes
pub const SIGNATURE_LEN: usize = 32;

/// Smallest V1 payload after the version byte:
/// app id (4) + token id (4) + subtoken presence (1) + flags (2) + signature (32)
pub const MIN_V1_PAYLOAD_LEN: usize = 4 + 4 + 1 + 2 + SIGNATURE_LEN;

/// Largest V1 token in bytes, every optional block present
pub const MAX_V1_TOKEN_LEN: usize = 1 + MIN_V1_PAYLOAD_LEN + 4 + 4 + 6 + 5;

/// Upper bound on accepted token text, well above any V1 token
pub const MAX_TOKEN_TEXT_LEN: usize = 256;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TokenConfig {
    /// Issuer-specific configuration
    #[serde(default)]
    pub issuer: IssuerConfig,

    /// Verifier-specific configuration
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TokenConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| TokenError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| TokenError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| TokenError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(ttl) = std::env::var("BAT_TOKEN_DEFAULT_TTL_MS") {
            if let Ok(val) = ttl.parse::<u64>() {
                config.issuer.default_ttl = Duration::from_millis(val);
            }
        }

        if let Ok(ttl) = std::env::var("BAT_TOKEN_MAX_TTL_MS") {
            if let Ok(val) = ttl.parse::<u64>() {
                config.issuer.max_ttl = Duration::from_millis(val);
            }
        }

        if let Ok(len) = std::env::var("BAT_TOKEN_MAX_TOKEN_LENGTH") {
            if let Ok(val) = len.parse::<usize>() {
                config.verifier.max_token_length = val;
            }
        }

        if let Ok(flag) = std::env::var("BAT_TOKEN_REQUIRE_EXPIRY") {
            if let Ok(val) = flag.parse::<bool>() {
                config.verifier.require_expiry = val;
            }
        }

        if let Ok(flag) = std::env::var("BAT_TOKEN_ENFORCE_IP_BINDING") {
            if let Ok(val) = flag.parse::<bool>() {
                config.verifier.enforce_ip_binding = val;
            }
        }

        if let Ok(level) = std::env::var("BAT_TOKEN_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                TokenError::ConfigError(format!("Invalid log level in environment: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TokenError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| TokenError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.issuer.validate());
        errors.extend(self.verifier.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TokenError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Issuer-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssuerConfig {
    /// TTL applied to new tokens; zero issues tokens without expiry, which
    /// requires `max_ttl` to be zero as well
    #[serde(with = "duration_serde")]
    pub default_ttl: Duration,

    /// Longest expiry the issuer will sign; zero disables the check
    #[serde(with = "duration_serde")]
    pub max_ttl: Duration,

    /// Whether new tokens carry the webhooks capability unless told otherwise
    pub webhooks_by_default: bool,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            max_ttl: Duration::from_secs(30 * 24 * 3600),
            webhooks_by_default: false,
        }
    }
}

impl IssuerConfig {
    /// Validate issuer configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.default_ttl.is_zero() && self.default_ttl.as_secs() < 1 {
            errors.push("Default TTL too short (minimum: 1s)".to_string());
        }

        // Expiry travels as signed 32-bit seconds
        if self.default_ttl.as_secs() > i32::MAX as u64 {
            errors.push(format!(
                "Default TTL too long: {}s (maximum: {}s)",
                self.default_ttl.as_secs(),
                i32::MAX
            ));
        }

        if !self.max_ttl.is_zero() {
            if self.max_ttl.as_secs() < 1 {
                errors.push("Max TTL too short (minimum: 1s)".to_string());
            }
            if self.default_ttl > self.max_ttl {
                errors.push("Default TTL cannot be larger than max TTL".to_string());
            }
            if self.default_ttl.is_zero() {
                errors.push("Default TTL must be set when max TTL is set".to_string());
            }
        }

        errors
    }
}

/// Verifier-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerifierConfig {
    /// Longest token text accepted before decoding is attempted
    pub max_token_length: usize,

    /// Reject tokens that carry no expiry
    pub require_expiry: bool,

    /// Tolerance applied when comparing expiry against the current time
    #[serde(with = "duration_serde")]
    pub clock_skew: Duration,

    /// Reject IP-bound tokens presented from a different address
    pub enforce_ip_binding: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_token_length: MAX_TOKEN_TEXT_LEN,
            require_expiry: false,
            clock_skew: Duration::from_secs(2),
            enforce_ip_binding: true,
        }
    }
}

impl VerifierConfig {
    /// Validate verifier configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // The smallest V1 token (44 bytes) encodes to 71 base32 characters
        let min_text_len = (1 + MIN_V1_PAYLOAD_LEN).div_ceil(5) * 8 - 1;
        if self.max_token_length < min_text_len {
            errors.push(format!(
                "Max token length too small: {} (minimum: {min_text_len})",
                self.max_token_length
            ));
        } else if self.max_token_length > 4096 {
            errors.push(format!(
                "Max token length too large: {} (maximum recommended: 4096)",
                self.max_token_length
            ));
        }

        if self.clock_skew.as_secs() > 300 {
            errors.push("Clock skew tolerance too long (maximum: 300s)".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("bat-token"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
