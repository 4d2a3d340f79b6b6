//! Prometheus metrics implementation.
//!
//! This module provides a concrete implementation of the `Metrics` trait using
//! the Prometheus metrics format. It delegates to utility functions in sibling
//! modules (`counters.rs`, `recorder.rs`) which handle the actual metrics
//! collection via the global `metrics` crate registry.
//!
//! The implementation follows a global registry pattern where metrics are
//! automatically registered when first used, and a single global handle
//! manages rendering all collected metrics in Prometheus text format.

use crate::domain::Metrics;

/// Prometheus-based metrics implementation.
///
/// This struct is intentionally empty because we use the global metrics registry
/// pattern via the `metrics` crate. All metrics are registered globally using
/// macros like `counter!()`, and the global PrometheusHandle stored in
/// `recorder.rs` manages the actual metrics collection and rendering.
pub struct PrometheusMetrics {
    // Empty - uses global metrics registry pattern
}

impl PrometheusMetrics {
    pub fn new() -> Self {
        tracing::info!("Creating Prometheus metrics");
        PrometheusMetrics {}
    }
}

impl Metrics for PrometheusMetrics {
    fn render(&self) -> String {
        // Use the recorder utility to get actual metrics
        super::render_metrics()
    }

    fn record_throttle_blocked(&self, scope: &str) {
        tracing::debug!("Recording throttled request for scope {scope}");
        super::increment_throttle_blocked(scope);
    }

    fn record_attempt_recorded(&self, scope: &str) {
        tracing::debug!("Recording failed attempt for scope {scope}");
        super::increment_attempt_recorded(scope);
    }

    fn record_email_enqueued(&self, kind: &str) {
        tracing::debug!("Recording enqueued {kind} email");
        super::increment_email_enqueued(kind);
    }
}
