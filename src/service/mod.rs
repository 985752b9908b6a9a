//! # Token Services
//!
//! Secret-holding wrappers around the codec.
//!
//! - **Issuer**: applies issuing policy, signs and encodes tokens
//! - **Verifier**: parses presented tokens, checks the signature, then expiry
//!   and IP binding policy
//!
//! Both are cheap to clone and safe to share across threads.

pub mod issuer;
pub mod verifier;

pub use issuer::TokenIssuer;
pub use verifier::{Rejection, TokenVerifier, Verdict};
