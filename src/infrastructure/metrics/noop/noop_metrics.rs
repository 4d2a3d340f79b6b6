use crate::domain::Metrics;

/// No-op metrics implementation for testing.
pub struct NoopMetrics;

impl NoopMetrics {
    pub fn new() -> Self {
        NoopMetrics
    }
}

impl Metrics for NoopMetrics {
    // ---
    fn render(&self) -> String {
        String::new()
    }
    fn record_throttle_blocked(&self, _scope: &str) {}
    fn record_attempt_recorded(&self, _scope: &str) {}
    fn record_email_enqueued(&self, _kind: &str) {}
}
