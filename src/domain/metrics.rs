use std::sync::Arc;

/// Abstraction for application metrics (counters, histograms).
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> String;

    /// Record a request rejected by the throttle for the given scope.
    fn record_throttle_blocked(&self, scope: &str);

    /// Record a failed attempt counted against the throttle for the given scope.
    fn record_attempt_recorded(&self, scope: &str);

    /// Record an email accepted by the dispatch queue ("verification", "password_reset").
    fn record_email_enqueued(&self, kind: &str);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
