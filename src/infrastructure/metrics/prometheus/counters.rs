use metrics::counter;

/// Increment the blocked-request counter for a scope.
pub fn increment_throttle_blocked(scope: &str) {
    counter!("throttle_blocked_total", "scope" => scope.to_string()).increment(1);
}

/// Increment the recorded-failure counter for a scope.
pub fn increment_attempt_recorded(scope: &str) {
    counter!("throttle_attempts_recorded_total", "scope" => scope.to_string()).increment(1);
}

/// Increment the enqueued-email counter for a message kind.
pub fn increment_email_enqueued(kind: &str) {
    counter!("emails_enqueued_total", "kind" => kind.to_string()).increment(1);
}
