//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by format and status
//! - `gateway_request_duration_seconds` (histogram): time to build the response
//!
//! # Design Decisions
//! - Labels are the selected format and status code; never the subscription URL
//! - Exposed on a separate listener so the gateway port stays public-safe

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "gateway_requests_total";
pub const REQUEST_DURATION: &str = "gateway_request_duration_seconds";

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished request.
pub fn record_request(format: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(REQUESTS_TOTAL, "format" => format, "status" => status.clone()).increment(1);
    histogram!(REQUEST_DURATION, "format" => format, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder() {
        // No recorder installed: recording is a no-op.
        record_request("singbox", 200, Instant::now());
    }
}
