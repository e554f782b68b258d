//! Metrics collection for the voting service
//!
//! Prometheus counters and gauges for vote traffic and aggregation runs,
//! text-encoded on the `/metrics` endpoint.

pub mod collector;

pub use collector::MetricsCollector;
