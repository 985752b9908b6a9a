//! Token issuing.
//!
//! [`TokenIssuer`] owns the signing secret and the issuer policy: default
//! TTL, maximum TTL and the default webhooks capability. With a maximum TTL
//! configured, every issued token must carry an expiry within it.

use crate::config::IssuerConfig;
use crate::core::v1::{TokenV1, TokenV1Builder};
use crate::error::{constants, Result, TokenError};
use crate::utils::metrics::{global_metrics, Timer};
use crate::utils::signing::Secret;
use chrono::Utc;
use std::net::IpAddr;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: Secret,
    config: IssuerConfig,
}

impl TokenIssuer {
    /// Create an issuer, rejecting invalid configuration
    pub fn new(secret: Secret, config: IssuerConfig) -> Result<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(TokenError::ConfigError(errors.join("; ")));
        }
        Ok(Self { secret, config })
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// A builder seeded with this issuer's defaults
    pub fn builder(&self, app_id: u32, token_id: u32) -> TokenV1Builder {
        let mut builder = TokenV1::builder(app_id, token_id)
            .with_webhooks_enabled(self.config.webhooks_by_default);
        if !self.config.default_ttl.is_zero() {
            builder = builder.with_ttl(self.config.default_ttl);
        }
        builder
    }

    /// Bind `builder` to `addr` under this issuer's secret
    pub fn bind_ip(&self, builder: TokenV1Builder, addr: IpAddr) -> TokenV1Builder {
        builder.bind_ip(addr, self.secret.as_bytes())
    }

    /// A builder for a sub-token delegated from `parent`.
    ///
    /// The sub-token shares the parent's app and token ids and inherits its
    /// expiry, rate limits, IP binding and capabilities; callers may narrow
    /// them further before issuing.
    pub fn subtoken(&self, parent: &TokenV1, subtoken_id: u32) -> TokenV1Builder {
        TokenV1Builder::from(parent).with_subtoken_id(subtoken_id)
    }

    /// Build, sign and encode a token
    #[instrument(skip(self, builder))]
    pub fn issue(&self, builder: TokenV1Builder) -> Result<String> {
        let _timer = Timer::start("issue");
        self.sign(builder)?.encode()
    }

    /// Build and sign a token without encoding it
    pub fn sign(&self, builder: TokenV1Builder) -> Result<TokenV1> {
        let mut token = builder.build()?;

        if !self.config.max_ttl.is_zero() {
            let max = chrono::Duration::from_std(self.config.max_ttl)
                .ok()
                .and_then(|d| Utc::now().checked_add_signed(d));
            let within = match (token.expire_at, max) {
                (Some(expire_at), Some(max)) => expire_at <= max,
                (Some(_), None) => true,
                // a token without expiry outlives any maximum
                (None, _) => false,
            };
            if !within {
                return Err(TokenError::InvalidField(
                    constants::ERR_TTL_EXCEEDS_MAX.into(),
                ));
            }
        }

        token.sign(self.secret.as_bytes())?;
        global_metrics().token_issued();
        debug!(
            app_id = token.app_id,
            token_id = token.token_id,
            subtoken_id = ?token.subtoken_id,
            expire_at = ?token.expire_at,
            "Token issued"
        );
        Ok(token)
    }
}
