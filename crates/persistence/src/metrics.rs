//! Backend request metrics.
//!
//! Provides functions for recording backend call metrics.

use metrics::{counter, histogram};
use std::time::Instant;

/// Record backend request duration.
pub fn record_request_duration(operation: &str, duration_secs: f64) {
    histogram!(
        "backend_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Record a failed backend request.
pub fn record_request_failure(operation: &str, kind: &'static str) {
    counter!(
        "backend_request_failures_total",
        "operation" => operation.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// A helper to time backend calls and record metrics.
///
/// Usage:
/// ```ignore
/// let timer = RequestTimer::new("list_documents");
/// let result = request.send().await;
/// timer.record();
/// result
/// ```
pub struct RequestTimer {
    operation: String,
    start: Instant,
}

impl RequestTimer {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            start: Instant::now(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_request_duration(&self.operation, duration);
    }
}
