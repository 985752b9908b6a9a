//! Integration tests for configuration validation

#![allow(clippy::expect_used)]

use bat_token::config::{IssuerConfig, LoggingConfig, TokenConfig, VerifierConfig};
use std::time::Duration;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = TokenConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_default_ttl_above_max() {
    let mut config = TokenConfig::default();
    config.issuer.default_ttl = Duration::from_secs(7200);
    config.issuer.max_ttl = Duration::from_secs(3600);

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Default TTL cannot be larger than max TTL")));
}

#[test]
fn test_sub_second_ttl() {
    let mut config = TokenConfig::default();
    config.issuer.default_ttl = Duration::from_millis(500);

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Default TTL too short")));
}

#[test]
fn test_ttl_beyond_wire_range() {
    let config = IssuerConfig {
        default_ttl: Duration::from_secs(i32::MAX as u64 + 1),
        max_ttl: Duration::ZERO,
        webhooks_by_default: false,
    };
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Default TTL too long")));
}

#[test]
fn test_zero_ttls_are_valid() {
    let config = IssuerConfig {
        default_ttl: Duration::ZERO,
        max_ttl: Duration::ZERO,
        webhooks_by_default: true,
    };
    assert!(config.validate().is_empty());
}

#[test]
fn test_max_token_length_bounds() {
    let mut verifier = VerifierConfig::default();
    verifier.max_token_length = 10;
    assert!(verifier
        .validate()
        .iter()
        .any(|e| e.contains("Max token length too small")));

    verifier.max_token_length = 71;
    assert!(verifier.validate().is_empty());

    verifier.max_token_length = 10_000;
    assert!(verifier
        .validate()
        .iter()
        .any(|e| e.contains("Max token length too large")));
}

#[test]
fn test_excessive_clock_skew() {
    let verifier = VerifierConfig {
        clock_skew: Duration::from_secs(3600),
        ..VerifierConfig::default()
    };
    assert!(verifier
        .validate()
        .iter()
        .any(|e| e.contains("Clock skew tolerance too long")));
}

#[test]
fn test_empty_app_name() {
    let logging = LoggingConfig {
        app_name: String::new(),
        ..LoggingConfig::default()
    };
    assert!(logging.validate().iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_validate_strict_collects_all_errors() {
    let config = TokenConfig::default_with_overrides(|c| {
        c.logging.app_name = String::new();
        c.verifier.max_token_length = 0;
    });
    let err = config.validate_strict().expect_err("should fail");
    let msg = err.to_string();
    assert!(msg.contains("cannot be empty"));
    assert!(msg.contains("Max token length too small"));
}

#[test]
fn test_toml_roundtrip_and_partial_sections() {
    let toml = r#"
        [issuer]
        default_ttl = 60000
        max_ttl = 600000
        webhooks_by_default = true

        [logging]
        app_name = "edge-gateway"
        log_level = "debug"
        json_format = true
    "#;
    let config = TokenConfig::from_toml(toml).expect("valid toml");
    assert_eq!(config.issuer.default_ttl, Duration::from_secs(60));
    assert!(config.issuer.webhooks_by_default);
    assert_eq!(config.logging.log_level, Level::DEBUG);
    // missing section falls back to defaults
    assert_eq!(config.verifier.max_token_length, VerifierConfig::default().max_token_length);
    assert!(config.validate().is_empty());
}

#[test]
fn test_invalid_log_level_rejected() {
    let toml = r#"
        [logging]
        app_name = "x"
        log_level = "loud"
        json_format = false
    "#;
    assert!(TokenConfig::from_toml(toml).is_err());
}

#[test]
fn test_save_and_load_file() {
    let path = std::env::temp_dir().join(format!("bat-token-config-{}.toml", std::process::id()));
    let config = TokenConfig::default_with_overrides(|c| c.verifier.require_expiry = true);
    config.save_to_file(&path).expect("save");
    let loaded = TokenConfig::from_file(&path).expect("load");
    let _ = std::fs::remove_file(&path);
    assert!(loaded.verifier.require_expiry);
}

#[test]
fn test_missing_file_is_config_error() {
    let err = TokenConfig::from_file("/definitely/not/here.toml").expect_err("missing file");
    assert!(err.to_string().contains("Failed to open config file"));
}

const ENV_VARS: [&str; 6] = [
    "BAT_TOKEN_DEFAULT_TTL_MS",
    "BAT_TOKEN_MAX_TTL_MS",
    "BAT_TOKEN_MAX_TOKEN_LENGTH",
    "BAT_TOKEN_REQUIRE_EXPIRY",
    "BAT_TOKEN_ENFORCE_IP_BINDING",
    "BAT_TOKEN_LOG_LEVEL",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

// Environment is process-global, so every from_env case lives in this one test
#[test]
fn test_from_env() {
    clear_env();
    let defaults = TokenConfig::from_env().expect("no overrides");
    assert_eq!(defaults.issuer.default_ttl, IssuerConfig::default().default_ttl);
    assert_eq!(defaults.logging.log_level, Level::INFO);

    std::env::set_var("BAT_TOKEN_DEFAULT_TTL_MS", "60000");
    std::env::set_var("BAT_TOKEN_MAX_TTL_MS", "600000");
    std::env::set_var("BAT_TOKEN_MAX_TOKEN_LENGTH", "128");
    std::env::set_var("BAT_TOKEN_REQUIRE_EXPIRY", "true");
    std::env::set_var("BAT_TOKEN_ENFORCE_IP_BINDING", "false");
    std::env::set_var("BAT_TOKEN_LOG_LEVEL", "debug");
    let loaded = TokenConfig::from_env();

    // unparseable numbers are ignored
    std::env::set_var("BAT_TOKEN_MAX_TOKEN_LENGTH", "lots");
    let ignored = TokenConfig::from_env();

    std::env::set_var("BAT_TOKEN_LOG_LEVEL", "loud");
    let bad_level = TokenConfig::from_env();
    clear_env();

    let loaded = loaded.expect("valid overrides");
    assert_eq!(loaded.issuer.default_ttl, Duration::from_secs(60));
    assert_eq!(loaded.issuer.max_ttl, Duration::from_secs(600));
    assert_eq!(loaded.verifier.max_token_length, 128);
    assert!(loaded.verifier.require_expiry);
    assert!(!loaded.verifier.enforce_ip_binding);
    assert_eq!(loaded.logging.log_level, Level::DEBUG);
    assert!(loaded.validate().is_empty());

    assert_eq!(
        ignored.expect("bad number is skipped").verifier.max_token_length,
        VerifierConfig::default().max_token_length
    );

    let err = bad_level.expect_err("invalid level");
    assert!(err.to_string().contains("Invalid log level in environment"));
}

#[test]
fn test_zero_default_ttl_with_max_ttl_rejected() {
    let config = IssuerConfig {
        default_ttl: Duration::ZERO,
        max_ttl: Duration::from_secs(3600),
        webhooks_by_default: false,
    };
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Default TTL must be set when max TTL is set")));
}
