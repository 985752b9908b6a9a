//! Token verification.
//!
//! [`TokenVerifier`] parses a presented token string, checks its signature
//! and applies the verifier policy (expiry, IP binding). Malformed input is an
//! error; a well-formed token that fails a check is a [`Verdict::Rejected`].

use crate::config::VerifierConfig;
use crate::error::{constants, Result, TokenError};
use crate::token::Token;
use crate::utils::metrics::{global_metrics, Timer};
use crate::utils::signing::Secret;
use chrono::{DateTime, Utc};
use std::fmt;
use std::net::IpAddr;
use tracing::{debug, instrument, warn};

/// Why a well-formed token was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Signature does not match the token contents under this secret
    BadSignature,
    /// Expiry lies in the past
    Expired,
    /// Policy requires an expiry and the token has none
    MissingExpiry,
    /// Token is bound to a different client address, or no address was supplied
    IpMismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::BadSignature => "bad signature",
            Rejection::Expired => "token expired",
            Rejection::MissingExpiry => "token has no expiry",
            Rejection::IpMismatch => "client address does not match binding",
        };
        f.write_str(s)
    }
}

/// Outcome of verifying a well-formed token
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted(Token),
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }

    /// The accepted token, if any
    pub fn token(&self) -> Option<&Token> {
        match self {
            Verdict::Accepted(t) => Some(t),
            Verdict::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Verdict::Accepted(_) => None,
            Verdict::Rejected(r) => Some(*r),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenVerifier {
    secret: Secret,
    config: VerifierConfig,
}

impl TokenVerifier {
    /// Create a verifier, rejecting invalid configuration
    pub fn new(secret: Secret, config: VerifierConfig) -> Result<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(TokenError::ConfigError(errors.join("; ")));
        }
        Ok(Self { secret, config })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify `token` against the current time
    pub fn verify(&self, token: &str, client_ip: Option<IpAddr>) -> Result<Verdict> {
        self.verify_at(token, Utc::now(), client_ip)
    }

    /// Verify `token` as of `now`
    #[instrument(skip(self, token), fields(len = token.len()))]
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
        client_ip: Option<IpAddr>,
    ) -> Result<Verdict> {
        let _timer = Timer::start("verify");
        if token.len() > self.config.max_token_length {
            global_metrics().parse_error();
            return Err(TokenError::InvalidEncoding(format!(
                "{} ({} > {})",
                constants::ERR_TOKEN_TOO_LONG,
                token.len(),
                self.config.max_token_length
            )));
        }

        let parsed = Token::parse(token)?;
        let metrics = global_metrics();
        metrics.verification_attempt();

        let verdict = match self.check(&parsed, now, client_ip) {
            Some(rejection) => {
                match rejection {
                    Rejection::BadSignature => metrics.signature_failure(),
                    Rejection::Expired | Rejection::MissingExpiry => metrics.expiry_rejection(),
                    Rejection::IpMismatch => metrics.ip_rejection(),
                }
                warn!(%rejection, "Token rejected");
                Verdict::Rejected(rejection)
            }
            None => {
                metrics.verification_accepted();
                debug!(version = %parsed.version(), "Token accepted");
                Verdict::Accepted(parsed)
            }
        };
        Ok(verdict)
    }

    /// First failing check, signature before policy
    fn check(
        &self,
        token: &Token,
        now: DateTime<Utc>,
        client_ip: Option<IpAddr>,
    ) -> Option<Rejection> {
        if !token.verify(self.secret.as_bytes()) {
            return Some(Rejection::BadSignature);
        }

        let Token::V1(v1) = token;

        match v1.expire_at {
            Some(_) => {
                let skew = chrono::Duration::from_std(self.config.clock_skew)
                    .unwrap_or_else(|_| chrono::Duration::zero());
                let cutoff = now.checked_sub_signed(skew).unwrap_or(now);
                if v1.is_expired_at(cutoff) {
                    return Some(Rejection::Expired);
                }
            }
            None if self.config.require_expiry => return Some(Rejection::MissingExpiry),
            None => {}
        }

        if self.config.enforce_ip_binding {
            if let Some(binding) = &v1.ip_binding {
                match client_ip {
                    Some(addr) if binding.matches(self.secret.as_bytes(), &addr) => {}
                    _ => return Some(Rejection::IpMismatch),
                }
            }
        }

        None
    }
}
