//! # bat-token
//!
//! Compact, self-describing bearer tokens authenticated with HMAC-SHA256.
//!
//! A token is a single base32 string that carries an application id, a token
//! id, an optional sub-token id, and optional expiry, rate limits, IP binding
//! and webhooks capability. Any service holding the shared secret can verify
//! it without a lookup.
//!
//! ## Layers
//! - [`core`](crate::core): field codecs, the V1 payload and the text encoding
//! - [`token`]: version dispatch over the closed set of formats
//! - [`utils::signing`]: HMAC tags and constant-time comparison
//! - [`service`]: issuer and verifier holding the secret and policy
//! - [`config`], [`error`], [`utils::logging`], [`utils::metrics`]: ambient plumbing
//!
//! ## Example
//! ```rust
//! use bat_token::{Token, TokenV1};
//! use std::time::Duration;
//!
//! let secret = b"secret";
//! let mut token = TokenV1::builder(10, 20)
//!     .with_subtoken_id(34534)
//!     .with_ttl(Duration::from_secs(3600))
//!     .build()?;
//! token.sign(secret)?;
//! let s = token.encode()?;
//!
//! let parsed: Token = s.parse()?;
//! assert!(parsed.verify(secret));
//! assert!(!parsed.verify(b"wrong"));
//! # Ok::<(), bat_token::error::TokenError>(())
//! ```
//!
//! Fields are authenticated, not encrypted. Expiry is data: the codec never
//! compares it against the clock, [`TokenVerifier`] does.

pub mod config;
pub mod core;
pub mod error;
pub mod service;
pub mod token;
pub mod utils;

pub use crate::core::ip::{IpBinding, IpVersion};
pub use crate::core::limits::RateLimits;
pub use crate::core::v1::{TokenV1, TokenV1Builder};
pub use error::{Result, TokenError};
pub use service::{Rejection, TokenIssuer, TokenVerifier, Verdict};
pub use token::{Token, Version};
pub use utils::signing::{Secret, Signature};
