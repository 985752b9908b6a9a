#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the issuer and verifier services

use bat_token::config::{IssuerConfig, TokenConfig, VerifierConfig};
use bat_token::utils::metrics::global_metrics;
use bat_token::{Rejection, Secret, TokenError, TokenIssuer, TokenVerifier};
use chrono::{Duration as ChronoDuration, Utc};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

fn pair(config: &TokenConfig) -> (TokenIssuer, TokenVerifier) {
    let secret = Secret::from("secret");
    (
        TokenIssuer::new(secret.clone(), config.issuer.clone()).unwrap(),
        TokenVerifier::new(secret, config.verifier.clone()).unwrap(),
    )
}

#[test]
fn test_issue_then_verify() {
    let (issuer, verifier) = pair(&TokenConfig::default());
    let s = issuer.issue(issuer.builder(10, 20).with_webhooks()).unwrap();
    let verdict = verifier.verify(&s, None).unwrap();
    let token = verdict.token().unwrap().as_v1().unwrap();
    assert!(token.webhooks);
    assert!(token.expire_at.is_some());
}

#[test]
fn test_verifier_with_other_secret_rejects() {
    let (issuer, _) = pair(&TokenConfig::default());
    let other = TokenVerifier::new(Secret::from("wrong"), VerifierConfig::default()).unwrap();
    let s = issuer.issue(issuer.builder(1, 2)).unwrap();
    assert_eq!(
        other.verify(&s, None).unwrap().rejection(),
        Some(Rejection::BadSignature)
    );
}

#[test]
fn test_expired_token_rejected_later() {
    let (issuer, verifier) = pair(&TokenConfig::default());
    let s = issuer
        .issue(issuer.builder(1, 2).with_ttl(Duration::from_secs(60)))
        .unwrap();
    let later = Utc::now() + ChronoDuration::seconds(600);
    assert_eq!(
        verifier.verify_at(&s, later, None).unwrap().rejection(),
        Some(Rejection::Expired)
    );
    assert!(verifier.verify(&s, None).unwrap().is_accepted());
}

#[test]
fn test_subtoken_delegation_verifies_independently() {
    let (issuer, verifier) = pair(&TokenConfig::default());
    let addr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 4));
    let parent = issuer
        .sign(issuer.bind_ip(issuer.builder(10, 20), addr))
        .unwrap();
    let child = issuer.issue(issuer.subtoken(&parent, 7)).unwrap();

    let verdict = verifier.verify(&child, Some(addr)).unwrap();
    let token = verdict.token().unwrap().as_v1().unwrap();
    assert_eq!(token.token_id, 20);
    assert_eq!(token.subtoken_id, Some(7));
    assert_eq!(
        verifier.verify(&child, None).unwrap().rejection(),
        Some(Rejection::IpMismatch)
    );
}

#[test]
fn test_malformed_input_is_error_not_rejection() {
    let (_, verifier) = pair(&TokenConfig::default());
    let err = verifier.verify("NOT-A-TOKEN", None).unwrap_err();
    assert!(matches!(err, TokenError::InvalidEncoding(_)));
}

#[test]
fn test_metrics_move() {
    let (issuer, verifier) = pair(&TokenConfig::default());
    let before = global_metrics().snapshot();
    let s = issuer.issue(issuer.builder(1, 1)).unwrap();
    verifier.verify(&s, None).unwrap();
    let after = global_metrics().snapshot();
    assert!(after.tokens_issued > before.tokens_issued);
    assert!(after.verifications_accepted > before.verifications_accepted);
}

#[test]
fn test_issuer_without_default_ttl_and_strict_verifier() {
    let config = TokenConfig::default_with_overrides(|c| {
        c.issuer.default_ttl = Duration::ZERO;
        c.issuer.max_ttl = Duration::ZERO;
        c.verifier.require_expiry = true;
    });
    let (issuer, verifier) = pair(&config);
    let s = issuer.issue(issuer.builder(1, 1)).unwrap();
    assert_eq!(
        verifier.verify(&s, None).unwrap().rejection(),
        Some(Rejection::MissingExpiry)
    );
}

#[test]
fn test_issuer_config_is_validated() {
    let bad = IssuerConfig {
        default_ttl: Duration::from_secs(u64::from(u32::MAX)),
        max_ttl: Duration::ZERO,
        webhooks_by_default: false,
    };
    assert!(TokenIssuer::new(Secret::generate(), bad).is_err());
}
