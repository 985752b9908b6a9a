//! # Error Types
//!
//! Error handling for the token codec.
//!
//! This module defines every failure that can occur while building, encoding,
//! parsing or signing a token.
//!
//! ## Error Categories
//! - **Format Errors**: bad text encoding, truncated buffers, unknown versions,
//!   out-of-range field values, trailing garbage
//! - **Signing Errors**: MAC construction failures, encoding an unsigned record
//! - **Configuration Errors**: invalid or unreadable configuration
//!
//! A signature mismatch is *not* an error. `verify` returns `false` and the
//! verifier service reports a [`Rejection`](crate::service::verifier::Rejection).
//!
//! ## Example Usage
//! ```rust
//! use bat_token::error::TokenError;
//! use bat_token::Token;
//! use tracing::{error, info};
//!
//! fn main() {
//!     match "ZZZZ".parse::<Token>() {
//!         Ok(token) => info!(version = ?token.version(), "Parsed token"),
//!         Err(TokenError::UnsupportedVersion(v)) => error!(version = v, "Unknown token version"),
//!         Err(e) => error!(error = %e, "Malformed token"),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Field validation errors
    pub const ERR_SUBTOKEN_PRESENCE: &str = "Subtoken presence byte must be 0 or 1";
    pub const ERR_PER_IP_FLAG: &str = "Rate limit per-IP byte must be 0 or 1";
    pub const ERR_IP_VERSION: &str = "IP binding version must be 4 or 6";
    pub const ERR_EXPIRY_RANGE: &str = "Expiry must fit a signed 32-bit unix timestamp";
    pub const ERR_RPS_VALUE: &str = "Rate limit rps must be finite and non-negative";
    pub const ERR_TTL_RANGE: &str = "TTL is out of range";
    pub const ERR_TTL_EXCEEDS_MAX: &str = "Token expiry exceeds the configured maximum TTL";

    /// Encoding errors
    pub const ERR_EMPTY_TOKEN: &str = "Token is empty";
    pub const ERR_TOKEN_TOO_LONG: &str = "Token text exceeds the maximum length";

    /// Signing errors
    pub const ERR_MAC_INIT: &str = "Failed to initialise HMAC-SHA256";
}

// TokenError is the primary error type for all token operations
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid token encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid token length: needed {needed} bytes, {remaining} remaining")]
    InvalidLength { needed: usize, remaining: usize },

    #[error("Unsupported token version: {0}")]
    UnsupportedVersion(u8),

    #[error("Invalid token field: {0}")]
    InvalidField(String),

    #[error("Unexpected {0} trailing bytes after signature")]
    TrailingBytes(usize),

    #[error("Token has not been signed")]
    Unsigned,

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl TokenError {
    /// Whether this error describes a malformed token rather than a local failure
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            TokenError::InvalidEncoding(_)
                | TokenError::InvalidLength { .. }
                | TokenError::UnsupportedVersion(_)
                | TokenError::InvalidField(_)
                | TokenError::TrailingBytes(_)
        )
    }
}

/// Type alias for Results using TokenError
pub type Result<T> = std::result::Result<T, TokenError>;
