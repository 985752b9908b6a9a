//! Structured logging setup.
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them call [`init_logging`] once at startup. `RUST_LOG` overrides the
//! configured level when set.

use crate::config::LoggingConfig;
use crate::error::{Result, TokenError};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber for `config`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_ascii_lowercase()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| TokenError::ConfigError(format!("Failed to install logger: {e}")))?;

    info!(app = %config.app_name, level = %config.log_level, "Logging initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig::default();
        // The first call may lose the race against another test, the second never succeeds
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
