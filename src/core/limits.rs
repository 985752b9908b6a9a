//! Per-token rate limit record.
//!
//! Wire layout (6 bytes):
//! ```text
//! [rps f32 (4)] [burst multiplier (1)] [per-ip (1)]
//! ```

use crate::core::fields::{decode_f32, put_f32};
use crate::error::{constants, Result, TokenError};
use bytes::BufMut;

/// Encoded size of a [`RateLimits`] record
pub const RATE_LIMITS_LEN: usize = 6;

/// Rate limits carried inside a token. Enforcement is left to the verifier's host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimits {
    /// Sustained requests per second
    pub rps: f32,
    /// Burst allowance as a multiple of `rps`
    pub burst_multiplier: u8,
    /// Whether the limit applies per client address instead of per token
    pub per_ip: bool,
}

impl RateLimits {
    pub fn new(rps: f32, burst_multiplier: u8, per_ip: bool) -> Self {
        Self {
            rps,
            burst_multiplier,
            per_ip,
        }
    }

    /// Check that the record is sensible to issue
    pub fn validate(&self) -> Result<()> {
        if !self.rps.is_finite() || self.rps < 0.0 {
            return Err(TokenError::InvalidField(constants::ERR_RPS_VALUE.into()));
        }
        Ok(())
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        put_f32(buf, self.rps);
        buf.put_u8(self.burst_multiplier);
        buf.put_u8(u8::from(self.per_ip));
    }

    /// Decode from an exact 6-byte slice; the caller has already checked the length
    pub fn decode(bytes: [u8; RATE_LIMITS_LEN]) -> Result<Self> {
        let per_ip = match bytes[5] {
            0 => false,
            1 => true,
            _ => return Err(TokenError::InvalidField(constants::ERR_PER_IP_FLAG.into())),
        };
        Ok(Self {
            rps: decode_f32([bytes[0], bytes[1], bytes[2], bytes[3]]),
            burst_multiplier: bytes[4],
            per_ip,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_layout() {
        let mut buf = BytesMut::new();
        RateLimits::new(2.5, 3, true).encode(&mut buf);
        assert_eq!(buf.len(), RATE_LIMITS_LEN);
        assert_eq!(&buf[..4], &2.5f32.to_bits().to_be_bytes());
        assert_eq!(buf[4], 3);
        assert_eq!(buf[5], 1);
    }

    #[test]
    fn test_decode() {
        let mut raw = [0u8; RATE_LIMITS_LEN];
        raw[..4].copy_from_slice(&100.0f32.to_bits().to_be_bytes());
        raw[4] = 5;
        let limits = RateLimits::decode(raw).unwrap();
        assert_eq!(limits, RateLimits::new(100.0, 5, false));
    }

    #[test]
    fn test_decode_rejects_bad_per_ip_byte() {
        let mut raw = [0u8; RATE_LIMITS_LEN];
        raw[5] = 2;
        assert!(matches!(
            RateLimits::decode(raw),
            Err(TokenError::InvalidField(_))
        ));
    }

    #[test]
    fn test_validate() {
        assert!(RateLimits::new(0.0, 0, false).validate().is_ok());
        assert!(RateLimits::new(-1.0, 1, false).validate().is_err());
        assert!(RateLimits::new(f32::NAN, 1, false).validate().is_err());
        assert!(RateLimits::new(f32::INFINITY, 1, false).validate().is_err());
    }
}
