//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! gateway, invoker, websocket:
//!     → tracing events with function / connection_id / path fields
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber fmt layer
//!     → Prometheus scrape endpoint (when enabled)
//! ```

pub mod logging;
pub mod metrics;
