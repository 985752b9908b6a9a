//! Text transport encoding.
//!
//! Tokens travel as RFC 4648 base32 (standard alphabet) with the trailing
//! `=` padding removed. Decoding restores the padding to the next multiple of
//! eight characters before handing the string to the standard decoder.
//! Input is accepted in either case.

use crate::error::{Result, TokenError};
use data_encoding::BASE32;

const PAD: char = '=';
const BLOCK: usize = 8;

/// Encode raw token bytes as unpadded base32
pub fn encode(bytes: &[u8]) -> String {
    let mut out = BASE32.encode(bytes);
    let trimmed = out.trim_end_matches(PAD).len();
    out.truncate(trimmed);
    out
}

/// Decode unpadded (or padded) base32 text back into bytes
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let mut padded = text.to_ascii_uppercase();
    let rem = padded.len() % BLOCK;
    if rem != 0 {
        padded.extend(std::iter::repeat(PAD).take(BLOCK - rem));
    }
    BASE32
        .decode(padded.as_bytes())
        .map_err(|e| TokenError::InvalidEncoding(e.to_string()))
}
