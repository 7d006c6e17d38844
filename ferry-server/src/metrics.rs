//! Prometheus metrics for the migration endpoints

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions
pub fn init_metrics() {
    describe_counter!("ferry_requests_total", "Total number of migration API requests");
    describe_counter!("ferry_unauthorized_total", "Requests rejected by the secret check");
    describe_counter!("ferry_migrations_total", "Migrations applied or reverted through the API");
    describe_histogram!("ferry_request_latency_seconds", "Migration API request latency in seconds");
}

/// Record a finished request
pub fn record_request(operation: &'static str, outcome: &'static str, latency_seconds: f64) {
    counter!("ferry_requests_total", 1, "operation" => operation, "outcome" => outcome);
    histogram!("ferry_request_latency_seconds", latency_seconds, "operation" => operation);
}

/// Record a request rejected by the gate
pub fn record_unauthorized(operation: &'static str) {
    counter!("ferry_unauthorized_total", 1, "operation" => operation);
}

/// Record migrations moved by a run endpoint
pub fn record_migrations(direction: &'static str, count: usize) {
    counter!("ferry_migrations_total", count as u64, "direction" => direction);
}

/// Timer for one request
pub struct RequestTimer {
    start: Instant,
    operation: &'static str,
}

impl RequestTimer {
    /// Start timing `operation`
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Operation being timed
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Record the request with its outcome
    pub fn finish(self, outcome: &'static str) {
        record_request(self.operation, outcome, self.start.elapsed().as_secs_f64());
    }
}

/// Storage for Prometheus handle
static PROMETHEUS_HANDLE: std::sync::OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    std::sync::OnceLock::new();

/// Install the Prometheus recorder for this process
pub fn init_prometheus() -> anyhow::Result<()> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let handle = builder.install_recorder()?;
    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("Failed to set Prometheus handle"))?;
    Ok(())
}

/// Rendered Prometheus metrics
pub fn get_prometheus_metrics() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Prometheus metrics not initialized\n".to_string())
}
