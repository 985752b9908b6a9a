//! Version dispatch.
//!
//! The first decoded byte selects the payload codec. Versions form a closed
//! set: adding one means adding a [`Version`] variant and a [`Token`] variant.

use crate::config::TOKEN_VERSION_V1;
use crate::core::text;
use crate::core::v1::TokenV1;
use crate::error::{constants, Result, TokenError};
use crate::utils::metrics::global_metrics;
use crate::utils::signing::Signature;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Token format version, the first byte of every decoded token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Version {
    V1 = TOKEN_VERSION_V1,
}

impl TryFrom<u8> for Version {
    type Error = TokenError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            TOKEN_VERSION_V1 => Ok(Version::V1),
            other => Err(TokenError::UnsupportedVersion(other)),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", *self as u8)
    }
}

/// A parsed or freshly built token of any supported version
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    V1(TokenV1),
}

impl Token {
    /// Decode a token string and dispatch on its version byte.
    ///
    /// The returned token is *not* verified.
    #[instrument(level = "debug", skip(s), fields(len = s.len()))]
    pub fn parse(s: &str) -> Result<Self> {
        let result = Self::parse_inner(s);
        let metrics = global_metrics();
        match &result {
            Ok(_) => metrics.token_parsed(),
            Err(e) => {
                metrics.parse_error();
                debug!(error = %e, "Rejected malformed token");
            }
        }
        result
    }

    fn parse_inner(s: &str) -> Result<Self> {
        let bytes = text::decode(s)?;
        let Some((&version, payload)) = bytes.split_first() else {
            return Err(TokenError::InvalidEncoding(constants::ERR_EMPTY_TOKEN.into()));
        };
        match Version::try_from(version)? {
            Version::V1 => Ok(Token::V1(TokenV1::from_payload(payload)?)),
        }
    }

    pub fn version(&self) -> Version {
        match self {
            Token::V1(_) => Version::V1,
        }
    }

    /// The V1 payload, if this is a V1 token
    pub fn as_v1(&self) -> Option<&TokenV1> {
        match self {
            Token::V1(t) => Some(t),
        }
    }

    pub fn into_v1(self) -> Option<TokenV1> {
        match self {
            Token::V1(t) => Some(t),
        }
    }

    /// Sign the payload in place, returning the new signature
    pub fn sign(&mut self, secret: &[u8]) -> Result<Signature> {
        match self {
            Token::V1(t) => t.sign(secret),
        }
    }

    /// Constant-time signature check; `false` on any mismatch
    pub fn verify(&self, secret: &[u8]) -> bool {
        match self {
            Token::V1(t) => t.verify(secret),
        }
    }

    /// Text form of a signed token
    pub fn encode(&self) -> Result<String> {
        match self {
            Token::V1(t) => t.encode(),
        }
    }
}

impl From<TokenV1> for Token {
    fn from(token: TokenV1) -> Self {
        Token::V1(token)
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        Token::parse(s)
    }
}
