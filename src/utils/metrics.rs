//! Observability and Metrics
//!
//! Counters for token issuing, parsing and verification outcomes.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Global metrics collector for token operations
#[derive(Debug)]
pub struct Metrics {
    /// Tokens signed and encoded by an issuer
    pub tokens_issued: AtomicU64,
    /// Token strings parsed successfully
    pub tokens_parsed: AtomicU64,
    /// Token strings rejected as malformed
    pub parse_errors: AtomicU64,
    /// Verification attempts on well-formed tokens
    pub verifications_total: AtomicU64,
    /// Tokens accepted by a verifier
    pub verifications_accepted: AtomicU64,
    /// Signature mismatches
    pub signature_failures: AtomicU64,
    /// Tokens rejected as expired or missing a required expiry
    pub expiry_rejections: AtomicU64,
    /// Tokens presented from an address they are not bound to
    pub ip_rejections: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            tokens_issued: AtomicU64::new(0),
            tokens_parsed: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
            verifications_total: AtomicU64::new(0),
            verifications_accepted: AtomicU64::new(0),
            signature_failures: AtomicU64::new(0),
            expiry_rejections: AtomicU64::new(0),
            ip_rejections: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an issued token
    pub fn token_issued(&self) {
        self.tokens_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful parse
    pub fn token_parsed(&self) {
        self.tokens_parsed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a malformed token
    pub fn parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a verification attempt
    pub fn verification_attempt(&self) {
        self.verifications_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an accepted token
    pub fn verification_accepted(&self) {
        self.verifications_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a signature mismatch
    pub fn signature_failure(&self) {
        self.signature_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an expiry rejection
    pub fn expiry_rejection(&self) {
        self.expiry_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an IP binding rejection
    pub fn ip_rejection(&self) {
        self.ip_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tokens_issued: self.tokens_issued.load(Ordering::Relaxed),
            tokens_parsed: self.tokens_parsed.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            verifications_total: self.verifications_total.load(Ordering::Relaxed),
            verifications_accepted: self.verifications_accepted.load(Ordering::Relaxed),
            signature_failures: self.signature_failures.load(Ordering::Relaxed),
            expiry_rejections: self.expiry_rejections.load(Ordering::Relaxed),
            ip_rejections: self.ip_rejections.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            tokens_issued = snapshot.tokens_issued,
            tokens_parsed = snapshot.tokens_parsed,
            parse_errors = snapshot.parse_errors,
            verifications_total = snapshot.verifications_total,
            verifications_accepted = snapshot.verifications_accepted,
            signature_failures = snapshot.signature_failures,
            expiry_rejections = snapshot.expiry_rejections,
            ip_rejections = snapshot.ip_rejections,
            uptime_seconds = snapshot.uptime_seconds,
            "Token metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub tokens_issued: u64,
    pub tokens_parsed: u64,
    pub parse_errors: u64,
    pub verifications_total: u64,
    pub verifications_accepted: u64,
    pub signature_failures: u64,
    pub expiry_rejections: u64,
    pub ip_rejections: u64,
    pub uptime_seconds: u64,
}

/// Global metrics instance (lazy static for simplicity)
static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
