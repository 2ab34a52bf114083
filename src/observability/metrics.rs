//! Invocation metrics.
//!
//! # Metrics
//! - `lambda_local_invocations_total` (counter): invocations by transport kind and status
//! - `lambda_local_invocation_duration_seconds` (histogram): time from request to reply

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::TransportKind;

/// Record one finished invocation.
pub fn record_invocation(kind: TransportKind, status: u16, start: Instant) {
    let outcome = if status >= 500 { "failure" } else { "success" };
    metrics::counter!(
        "lambda_local_invocations_total",
        "kind" => kind.as_str(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("lambda_local_invocation_duration_seconds", "kind" => kind.as_str())
        .record(start.elapsed().as_secs_f64());
}

/// Install the Prometheus exporter on `addr`. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}
