//! Gateway metrics.
//!
//! # Metrics
//! - `gateway_invocations_total` (counter): invocations by function, trigger, outcome
//! - `gateway_invocation_duration_seconds` (histogram): downstream latency
//! - `gateway_queue_depth` (gauge): queued plus running invocations per function
//! - `gateway_websocket_connections` (gauge): open WebSocket connections
//!
//! Without an installed recorder every call is a no-op, so the exporter is
//! only set up when metrics are enabled.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

/// What caused an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Http,
    WebSocket,
    Direct,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Http => "http",
            Trigger::WebSocket => "websocket",
            Trigger::Direct => "direct",
        }
    }
}

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(address: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(address)
        .install()?;
    register_metrics();
    tracing::info!(%address, "Prometheus metrics exporter listening");
    Ok(())
}

fn register_metrics() {
    describe_counter!(
        "gateway_invocations_total",
        "Function invocations by function, trigger and outcome"
    );
    describe_histogram!(
        "gateway_invocation_duration_seconds",
        "Time spent in the downstream function call"
    );
    describe_gauge!(
        "gateway_queue_depth",
        "Invocations queued or running per function"
    );
    describe_gauge!(
        "gateway_websocket_connections",
        "Currently open WebSocket connections"
    );
}

pub fn record_invocation(function: &str, trigger: Trigger, outcome: &'static str, duration: Duration) {
    counter!(
        "gateway_invocations_total",
        "function" => function.to_string(),
        "trigger" => trigger.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "gateway_invocation_duration_seconds",
        "function" => function.to_string(),
        "trigger" => trigger.as_str()
    )
    .record(duration.as_secs_f64());
}

pub fn record_queue_depth(function: &str, depth: usize) {
    gauge!("gateway_queue_depth", "function" => function.to_string()).set(depth as f64);
}

pub fn record_ws_connections(open: usize) {
    gauge!("gateway_websocket_connections").set(open as f64);
}
