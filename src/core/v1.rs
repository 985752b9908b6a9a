//! # Token V1
//!
//! The version 1 payload: mandatory identifiers, an optional sub-token id, a
//! 16-bit flag word announcing optional blocks, and a trailing HMAC-SHA256
//! signature.
//!
//! ## Wire Format
//! ```text
//! [version=1 (1)] [app id (4)] [token id (4)] [subtoken? (1)] [subtoken id (4)]?
//! [flags (2)] [expire at (4)]? [rate limits (6)]? [ip binding (5)]? [signature (32)]
//! ```
//!
//! Flag bits, counted from the most significant bit:
//! - bit 0: expiry present
//! - bit 1: rate limits present
//! - bit 2: IP binding present
//! - bit 3: webhooks enabled (no payload)
//!
//! Bits 4-15 are reserved. They are not interpreted, but they are kept on the
//! parsed record and written back on re-serialization so the signature still
//! verifies for tokens minted by a newer issuer that only adds payload-free
//! flags.
//!
//! ## Expiry width
//!
//! Expiry is a signed 32-bit count of Unix seconds, so it covers 1901-12-13
//! through 2038-01-19. Issuers that write the field as unsigned seconds agree
//! with this codec up to 2038; an expiry they place after that instant reads
//! back here as a date between 1901 and 1970, and the token is treated as
//! expired.

use crate::config::{MIN_V1_PAYLOAD_LEN, SIGNATURE_LEN, TOKEN_VERSION_V1};
use crate::core::fields::{is_bit_set, put_u16, put_u32, set_bit, FieldReader};
use crate::core::ip::{IpBinding, IP_BINDING_LEN};
use crate::core::limits::{RateLimits, RATE_LIMITS_LEN};
use crate::core::text;
use crate::error::{constants, Result, TokenError};
use crate::utils::signing::{compute_tag, verify_tag, Signature};
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, TimeZone, Utc};
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, instrument, trace};

/// Flag bit announcing the expiry block
pub const FLAG_EXPIRY: u8 = 0;
/// Flag bit announcing the rate limit block
pub const FLAG_RATE_LIMITS: u8 = 1;
/// Flag bit announcing the IP binding block
pub const FLAG_IP_BINDING: u8 = 2;
/// Flag bit for the webhooks capability
pub const FLAG_WEBHOOKS: u8 = 3;

/// Mask of the bits this version understands
pub const KNOWN_FLAGS_MASK: u16 = 0xF000;

/// Initial capacity that fits every V1 token without reallocating
const SERIALIZE_CAPACITY: usize = 64;

/// Convert an expiry into the signed 32-bit seconds carried on the wire
fn expiry_to_wire(expire_at: &DateTime<Utc>) -> Result<u32> {
    let secs = i32::try_from(expire_at.timestamp())
        .map_err(|_| TokenError::InvalidField(constants::ERR_EXPIRY_RANGE.into()))?;
    Ok(secs as u32)
}

fn expiry_from_wire(raw: u32) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(i64::from(raw as i32), 0)
        .single()
        .ok_or_else(|| TokenError::InvalidField(constants::ERR_EXPIRY_RANGE.into()))
}

/// Drop sub-second precision, which the wire cannot carry
fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(at.timestamp(), 0).single().unwrap_or(at)
}

/// A version 1 token.
///
/// Built through [`TokenV1Builder`], signed with [`TokenV1::sign`], and
/// encoded with [`TokenV1::encode`]. A parsed token carries the signature as
/// received; call [`TokenV1::verify`] before trusting any field.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenV1 {
    pub app_id: u32,
    pub token_id: u32,
    /// Present iff this is a sub-token delegated under `token_id`
    pub subtoken_id: Option<u32>,
    /// `None` means the token never expires
    pub expire_at: Option<DateTime<Utc>>,
    pub rate_limits: Option<RateLimits>,
    pub ip_binding: Option<IpBinding>,
    pub webhooks: bool,
    /// Flag bits outside [`KNOWN_FLAGS_MASK`], preserved as received
    pub reserved_flags: u16,
    /// `None` until the token is signed
    pub signature: Option<Signature>,
}

impl TokenV1 {
    /// Start building a token for `app_id` / `token_id`
    pub fn builder(app_id: u32, token_id: u32) -> TokenV1Builder {
        TokenV1Builder::new(app_id, token_id)
    }

    pub fn is_subtoken(&self) -> bool {
        self.subtoken_id.is_some()
    }

    /// Whether the token's expiry lies at or before `now`.
    /// Tokens without expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expire_at {
            Some(at) => at <= now,
            None => false,
        }
    }

    /// Flag word as it appears on the wire
    pub fn flags(&self) -> u16 {
        let mut flags = self.reserved_flags & !KNOWN_FLAGS_MASK;
        if self.expire_at.is_some() {
            flags = set_bit(flags, FLAG_EXPIRY);
        }
        if self.rate_limits.is_some() {
            flags = set_bit(flags, FLAG_RATE_LIMITS);
        }
        if self.ip_binding.is_some() {
            flags = set_bit(flags, FLAG_IP_BINDING);
        }
        if self.webhooks {
            flags = set_bit(flags, FLAG_WEBHOOKS);
        }
        flags
    }

    /// Serialize everything except the signature, version byte included.
    ///
    /// The flag word sits before the optional blocks but depends on them, so
    /// two bytes are reserved first and backfilled once the blocks are written.
    pub fn to_unsigned_bytes(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(SERIALIZE_CAPACITY);
        buf.put_u8(TOKEN_VERSION_V1);
        put_u32(&mut buf, self.app_id);
        put_u32(&mut buf, self.token_id);
        match self.subtoken_id {
            Some(id) => {
                buf.put_u8(1);
                put_u32(&mut buf, id);
            }
            None => buf.put_u8(0),
        }

        let flags_at = buf.len();
        put_u16(&mut buf, 0);
        let mut flags = self.reserved_flags & !KNOWN_FLAGS_MASK;

        if let Some(expire_at) = &self.expire_at {
            put_u32(&mut buf, expiry_to_wire(expire_at)?);
            flags = set_bit(flags, FLAG_EXPIRY);
        }
        if let Some(limits) = &self.rate_limits {
            limits.encode(&mut buf);
            flags = set_bit(flags, FLAG_RATE_LIMITS);
        }
        if let Some(binding) = &self.ip_binding {
            binding.encode(&mut buf);
            flags = set_bit(flags, FLAG_IP_BINDING);
        }
        if self.webhooks {
            flags = set_bit(flags, FLAG_WEBHOOKS);
        }

        debug_assert_eq!(flags, self.flags());
        buf[flags_at..flags_at + 2].copy_from_slice(&flags.to_be_bytes());
        Ok(buf)
    }

    /// Full binary form, signature appended
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let signature = self.signature.as_ref().ok_or(TokenError::Unsigned)?;
        let mut buf = self.to_unsigned_bytes()?;
        buf.extend_from_slice(signature);
        Ok(buf.to_vec())
    }

    /// Text form suitable for headers and URLs
    pub fn encode(&self) -> Result<String> {
        Ok(text::encode(&self.to_bytes()?))
    }

    /// Compute the signature under `secret`, store it, and return it.
    /// Any previous signature is overwritten.
    #[instrument(skip(self, secret), fields(app_id = self.app_id, token_id = self.token_id))]
    pub fn sign(&mut self, secret: &[u8]) -> Result<Signature> {
        let unsigned = self.to_unsigned_bytes()?;
        let tag = compute_tag(secret, &unsigned)?;
        self.signature = Some(tag);
        trace!(len = unsigned.len(), "Token signed");
        Ok(tag)
    }

    /// Whether the stored signature matches the current fields under `secret`.
    ///
    /// Mismatches, unsigned tokens and fields that cannot be serialized all
    /// report `false`.
    pub fn verify(&self, secret: &[u8]) -> bool {
        let Some(signature) = self.signature.as_ref() else {
            return false;
        };
        match self.to_unsigned_bytes() {
            Ok(unsigned) => verify_tag(secret, &unsigned, signature),
            Err(_) => false,
        }
    }

    /// Parse the bytes that follow the version byte
    #[instrument(level = "trace", skip(payload), fields(len = payload.len()))]
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < MIN_V1_PAYLOAD_LEN {
            return Err(TokenError::InvalidLength {
                needed: MIN_V1_PAYLOAD_LEN,
                remaining: payload.len(),
            });
        }

        let mut r = FieldReader::new(payload);
        let app_id = r.read_u32()?;
        let token_id = r.read_u32()?;
        let subtoken_id = match r.read_u8()? {
            0 => None,
            1 => Some(r.read_u32()?),
            _ => {
                return Err(TokenError::InvalidField(
                    constants::ERR_SUBTOKEN_PRESENCE.into(),
                ))
            }
        };

        let flags = r.read_u16()?;
        let expire_at = if is_bit_set(flags, FLAG_EXPIRY) {
            Some(expiry_from_wire(r.read_u32()?)?)
        } else {
            None
        };
        let rate_limits = if is_bit_set(flags, FLAG_RATE_LIMITS) {
            Some(RateLimits::decode(r.read_array::<RATE_LIMITS_LEN>()?)?)
        } else {
            None
        };
        let ip_binding = if is_bit_set(flags, FLAG_IP_BINDING) {
            Some(IpBinding::decode(r.read_array::<IP_BINDING_LEN>()?)?)
        } else {
            None
        };
        let webhooks = is_bit_set(flags, FLAG_WEBHOOKS);

        let reserved_flags = flags & !KNOWN_FLAGS_MASK;
        if reserved_flags != 0 {
            debug!(reserved_flags, "Token carries reserved flag bits");
        }

        let signature = r.read_array::<SIGNATURE_LEN>()?;
        if r.remaining() != 0 {
            return Err(TokenError::TrailingBytes(r.remaining()));
        }

        Ok(Self {
            app_id,
            token_id,
            subtoken_id,
            expire_at,
            rate_limits,
            ip_binding,
            webhooks,
            reserved_flags,
            signature: Some(signature),
        })
    }
}

/// Fluent builder for [`TokenV1`].
///
/// Setters consume and return the builder; [`TokenV1Builder::build`] checks
/// that every field can be represented on the wire and freezes the record.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenV1Builder {
    app_id: u32,
    token_id: u32,
    subtoken_id: Option<u32>,
    expire_at: Option<DateTime<Utc>>,
    ttl_error: bool,
    ip_error: bool,
    rate_limits: Option<RateLimits>,
    ip_binding: Option<IpBinding>,
    webhooks: bool,
}

impl TokenV1Builder {
    pub fn new(app_id: u32, token_id: u32) -> Self {
        Self {
            app_id,
            token_id,
            subtoken_id: None,
            expire_at: None,
            ttl_error: false,
            ip_error: false,
            rate_limits: None,
            ip_binding: None,
            webhooks: false,
        }
    }

    /// Make this a sub-token of `token_id`
    pub fn with_subtoken_id(mut self, id: u32) -> Self {
        self.subtoken_id = Some(id);
        self
    }

    /// Expire `ttl` from now
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        match chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
        {
            Some(at) => {
                self.expire_at = Some(truncate_to_seconds(at));
                self.ttl_error = false;
            }
            None => self.ttl_error = true,
        }
        self
    }

    /// Expire at an absolute time, truncated to whole seconds
    pub fn with_expire_at(mut self, at: DateTime<Utc>) -> Self {
        self.expire_at = Some(truncate_to_seconds(at));
        self.ttl_error = false;
        self
    }

    /// Remove any expiry set so far
    pub fn without_expiry(mut self) -> Self {
        self.expire_at = None;
        self.ttl_error = false;
        self
    }

    pub fn with_rate_limits(mut self, rps: f32, burst_multiplier: u8, per_ip: bool) -> Self {
        self.rate_limits = Some(RateLimits::new(rps, burst_multiplier, per_ip));
        self
    }

    pub fn with_webhooks(mut self) -> Self {
        self.webhooks = true;
        self
    }

    pub fn with_webhooks_enabled(mut self, enabled: bool) -> Self {
        self.webhooks = enabled;
        self
    }

    pub fn with_ip_binding(mut self, binding: IpBinding) -> Self {
        self.ip_binding = Some(binding);
        self.ip_error = false;
        self
    }

    /// Bind the token to `addr`, hashed under the secret the token will be signed with
    pub fn bind_ip(mut self, addr: IpAddr, secret: &[u8]) -> Self {
        match IpBinding::from_addr(secret, addr) {
            Ok(binding) => self.with_ip_binding(binding),
            Err(_) => {
                self.ip_error = true;
                self
            }
        }
    }

    /// Expiry currently configured, if any
    pub fn expire_at(&self) -> Option<DateTime<Utc>> {
        self.expire_at
    }

    /// Validate and freeze into an unsigned token
    pub fn build(self) -> Result<TokenV1> {
        if self.ttl_error {
            return Err(TokenError::InvalidField(constants::ERR_TTL_RANGE.into()));
        }
        if self.ip_error {
            return Err(TokenError::Signing(constants::ERR_MAC_INIT.into()));
        }
        if let Some(at) = &self.expire_at {
            expiry_to_wire(at)?;
        }
        if let Some(limits) = &self.rate_limits {
            limits.validate()?;
        }

        Ok(TokenV1 {
            app_id: self.app_id,
            token_id: self.token_id,
            subtoken_id: self.subtoken_id,
            expire_at: self.expire_at,
            rate_limits: self.rate_limits,
            ip_binding: self.ip_binding,
            webhooks: self.webhooks,
            reserved_flags: 0,
            signature: None,
        })
    }

    /// Build and sign in one step
    pub fn sign(self, secret: &[u8]) -> Result<TokenV1> {
        let mut token = self.build()?;
        token.sign(secret)?;
        Ok(token)
    }
}

impl From<&TokenV1> for TokenV1Builder {
    /// Seed a builder with every field of an existing token
    fn from(token: &TokenV1) -> Self {
        Self {
            app_id: token.app_id,
            token_id: token.token_id,
            subtoken_id: token.subtoken_id,
            expire_at: token.expire_at,
            ttl_error: false,
            ip_error: false,
            rate_limits: token.rate_limits,
            ip_binding: token.ip_binding,
            webhooks: token.webhooks,
        }
    }
}
