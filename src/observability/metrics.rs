//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_requests_total` (counter): requests by method, status
//! - `ledger_request_duration_seconds` (histogram): latency by method
//! - `ledger_rate_limited_total` (counter): requests rejected with 429
//!
//! Recording is a no-op until [`init_metrics`] installs the recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    describe_counter!("ledger_requests_total", "Total HTTP requests handled");
    describe_histogram!(
        "ledger_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "ledger_rate_limited_total",
        "Requests rejected by the rate limiter"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "ledger_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "ledger_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a request rejected by the rate limiter.
pub fn record_rate_limited() {
    counter!("ledger_rate_limited_total").increment(1);
}
