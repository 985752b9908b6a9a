//! IP binding record.
//!
//! A token can be tied to a client address without revealing it: the record
//! carries the address family and the first four bytes of an HMAC-SHA256
//! over the family tag and address octets, keyed with the token secret.
//! Without the secret the bound address cannot be recovered by enumerating
//! the address space.
//!
//! Wire layout (5 bytes):
//! ```text
//! [ip version (1)] [hash u32 (4)]
//! ```

use crate::core::fields::{decode_u32, put_u32};
use crate::error::{constants, Result, TokenError};
use crate::utils::signing::compute_tag;
use bytes::BufMut;
use std::net::IpAddr;

/// Encoded size of an [`IpBinding`] record
pub const IP_BINDING_LEN: usize = 5;

/// Address family of a bound IP, tagged with its version number on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IpVersion {
    V4 = 4,
    V6 = 6,
}

impl TryFrom<u8> for IpVersion {
    type Error = TokenError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            4 => Ok(IpVersion::V4),
            6 => Ok(IpVersion::V6),
            _ => Err(TokenError::InvalidField(format!(
                "{} (got {tag})",
                constants::ERR_IP_VERSION
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpBinding {
    pub version: IpVersion,
    pub hash: u32,
}

impl From<&IpAddr> for IpVersion {
    fn from(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

/// Truncated HMAC-SHA256 of the family tag and address octets
fn hash_addr(secret: &[u8], addr: &IpAddr) -> Result<u32> {
    let mut input = Vec::with_capacity(17);
    input.push(IpVersion::from(addr) as u8);
    match addr {
        IpAddr::V4(v4) => input.extend_from_slice(&v4.octets()),
        IpAddr::V6(v6) => input.extend_from_slice(&v6.octets()),
    }
    let tag = compute_tag(secret, &input)?;
    Ok(decode_u32([tag[0], tag[1], tag[2], tag[3]]))
}

impl IpBinding {
    pub fn new(version: IpVersion, hash: u32) -> Self {
        Self { version, hash }
    }

    /// Bind to a concrete client address under `secret`
    pub fn from_addr(secret: &[u8], addr: IpAddr) -> Result<Self> {
        Ok(Self {
            version: IpVersion::from(&addr),
            hash: hash_addr(secret, &addr)?,
        })
    }

    /// Whether `addr` is the address this binding was derived from under `secret`.
    ///
    /// The hash is truncated, so unrelated addresses collide with
    /// probability 2^-32.
    pub fn matches(&self, secret: &[u8], addr: &IpAddr) -> bool {
        match Self::from_addr(secret, *addr) {
            Ok(expected) => *self == expected,
            Err(_) => false,
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.version as u8);
        put_u32(buf, self.hash);
    }

    /// Decode from an exact 5-byte slice; the caller has already checked the length
    pub fn decode(bytes: [u8; IP_BINDING_LEN]) -> Result<Self> {
        Ok(Self {
            version: IpVersion::try_from(bytes[0])?,
            hash: decode_u32([bytes[1], bytes[2], bytes[3], bytes[4]]),
        })
    }
}
