//! # Utility Modules
//!
//! Supporting utilities for signing, logging and observability.
//!
//! ## Components
//! - **Signing**: HMAC-SHA256 tags, constant-time comparison, zeroized secrets
//! - **Logging**: `tracing-subscriber` bootstrap driven by [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Metrics**: Thread-safe counters for issue, parse and verify outcomes
//!
//! ## Security
//! - Signature comparison through `subtle::ConstantTimeEq`
//! - Secrets wiped on drop (zeroize crate) and redacted from `Debug`
//! - Secrets are never recorded in spans or events

pub mod logging;
pub mod metrics;
pub mod signing;

// Re-export public types for advanced users
pub use metrics::{global_metrics, Metrics, MetricsSnapshot};
pub use signing::{Secret, Signature};
