//! # Core Token Components
//!
//! Field codecs, the version 1 payload and the text transport encoding.
//!
//! ## Components
//! - **Fields**: big-endian integers, floats and MSB-first flag words
//! - **Limits**: the 6-byte rate limit record
//! - **Ip**: the 5-byte IP binding record
//! - **V1**: the version 1 payload, its builder and its signature
//! - **Text**: unpadded base32 transport form
//!
//! ## Wire Format (V1)
//! ```text
//! [Version(1)] [AppId(4)] [TokenId(4)] [Sub(1)] [SubId(4)]? [Flags(2)] [Optional...] [Signature(32)]
//! ```
//!
//! ## Security
//! - Every read is length-checked before the bytes are touched
//! - Bytes after the signature are rejected
//! - Field contents are authenticated, not encrypted

pub mod fields;
pub mod ip;
pub mod limits;
pub mod text;
pub mod v1;
