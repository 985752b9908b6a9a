//! HMAC-SHA256 signing and constant-time verification.
//!
//! The tag always covers the unsigned serialization of a token, i.e. every
//! byte up to but excluding the signature. Secrets are held in [`Secret`],
//! which wipes its bytes on drop and never prints them.

use crate::config::SIGNATURE_LEN;
use crate::error::{constants, Result, TokenError};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Authentication tag attached to every signed token
pub type Signature = [u8; SIGNATURE_LEN];

/// Shared signing secret
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Generate a random 32-byte secret from the thread-local CSPRNG
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {}])", self.0.len())
    }
}

impl From<&[u8]> for Secret {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

/// Compute the HMAC-SHA256 tag of `message` under `secret`
pub fn compute_tag(secret: &[u8], message: &[u8]) -> Result<Signature> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| TokenError::Signing(format!("{}: {e}", constants::ERR_MAC_INIT)))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().into())
}

/// Recompute the tag and compare it to `expected` in constant time
pub fn verify_tag(secret: &[u8], message: &[u8], expected: &Signature) -> bool {
    match compute_tag(secret, message) {
        Ok(actual) => actual.ct_eq(expected).into(),
        Err(_) => false,
    }
}
