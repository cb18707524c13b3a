//! # OpenTelemetry Metrics
//!
//! Instruments are created against the global meter provider. Installing an
//! exporter (OTLP, Prometheus) is left to the embedding process; without one
//! the global provider is a no-op and recording is free.

pub mod health;

/// Initialize every instrument group
pub fn init_metrics() {
    health::init();
}
