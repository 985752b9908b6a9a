//! # Fixed-Width Fields
//!
//! Big-endian integer, float and flag-word helpers shared by every token
//! version.
//!
//! Writes go straight into a [`BufMut`]; reads go through [`FieldReader`],
//! which checks the remaining length before touching any byte so truncated
//! input never yields a partial value.
//!
//! ## Flag Words
//! Bits are numbered from the most significant end: bit 0 is `0x8000`,
//! bit 15 is `0x0001`. Indices above 15 are ignored by [`set_bit`] and
//! reported unset by [`is_bit_set`].

use crate::error::{Result, TokenError};
use bytes::BufMut;

/// Highest addressable bit in a flag word
pub const MAX_FLAG_BIT: u8 = 15;

#[inline]
fn bit_mask(bit: u8) -> Option<u16> {
    if bit > MAX_FLAG_BIT {
        return None;
    }
    Some(1u16 << (MAX_FLAG_BIT - bit))
}

/// Returns `word` with `bit` set, or `word` unchanged if `bit` is out of range
#[inline]
pub fn set_bit(word: u16, bit: u8) -> u16 {
    match bit_mask(bit) {
        Some(mask) => word | mask,
        None => word,
    }
}

/// Whether `bit` is set in `word`; out-of-range bits are never set
#[inline]
pub fn is_bit_set(word: u16, bit: u8) -> bool {
    match bit_mask(bit) {
        Some(mask) => word & mask == mask,
        None => false,
    }
}

/// Append a big-endian `u16`
#[inline]
pub fn put_u16(buf: &mut impl BufMut, value: u16) {
    buf.put_u16(value);
}

/// Append a big-endian `u32`
#[inline]
pub fn put_u32(buf: &mut impl BufMut, value: u32) {
    buf.put_u32(value);
}

/// Append an `f32` as the big-endian encoding of its IEEE-754 bits
#[inline]
pub fn put_f32(buf: &mut impl BufMut, value: f32) {
    put_u32(buf, value.to_bits());
}

/// Decode a big-endian `u32` from exactly four bytes
#[inline]
pub fn decode_u32(bytes: [u8; 4]) -> u32 {
    u32::from_be_bytes(bytes)
}

/// Decode an `f32` from the big-endian encoding of its bits
#[inline]
pub fn decode_f32(bytes: [u8; 4]) -> f32 {
    f32::from_bits(decode_u32(bytes))
}

/// Bounds-checked cursor over an untrusted byte slice
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Current offset into the underlying slice
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Fail unless at least `needed` bytes remain
    pub fn ensure(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(TokenError::InvalidLength {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Consume exactly `N` bytes
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(decode_u32(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(decode_f32(self.read_array()?))
    }
}
