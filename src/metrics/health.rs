//! # Health Monitor Metrics
//!
//! OpenTelemetry instruments exported by the health monitor:
//! - per-item state-set gauge (one sample per possible state, exactly one set)
//! - refresh cycle counters and duration
//! - namespaces processed by the last cycle
//!
//! ## Usage
//!
//! ```rust
//! use mesh_health::metrics::health::*;
//! use mesh_health::models::{HealthStatus, HealthType};
//!
//! init();
//! record_item_status("east", "bookinfo", HealthType::Service, "reviews", HealthStatus::Degraded);
//! record_refresh_cycle("success", 125.0, 12, 0);
//! ```

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

use crate::models::{HealthStatus, HealthType};

static HEALTH_METER: OnceLock<Meter> = OnceLock::new();

fn meter() -> &'static Meter {
    HEALTH_METER.get_or_init(|| opentelemetry::global::meter_provider().meter("mesh-health"))
}

// ============================================================================
// Gauges
// ============================================================================

/// Per-item health state set (1 = active state, 0 = any other state)
///
/// Labels:
/// - cluster, namespace
/// - health_type: app, service, workload
/// - name: item name
/// - state: NA, Healthy, Not Ready, Degraded, Failure
pub fn health_status() -> Gauge<u64> {
    meter()
        .u64_gauge("mesh_health.status")
        .with_description("Health state of an app, service or workload (1 for the active state)")
        .build()
}

/// Namespaces processed by the most recent refresh cycle
pub fn refresh_namespaces() -> Gauge<u64> {
    meter()
        .u64_gauge("mesh_health.refresh.namespaces")
        .with_description("Namespaces processed by the most recent health refresh")
        .build()
}

// ============================================================================
// Counters
// ============================================================================

/// Refresh cycles run
///
/// Labels:
/// - outcome: success, failed, timeout, skipped, cancelled
pub fn refresh_cycles_total() -> Counter<u64> {
    meter()
        .u64_counter("mesh_health.refresh.cycles.total")
        .with_description("Total number of health refresh cycles")
        .build()
}

/// Cluster and namespace units that failed inside refresh cycles
pub fn refresh_errors_total() -> Counter<u64> {
    meter()
        .u64_counter("mesh_health.refresh.errors.total")
        .with_description("Total number of failed units across health refresh cycles")
        .build()
}

// ============================================================================
// Histograms
// ============================================================================

/// Refresh cycle duration in milliseconds
pub fn refresh_duration() -> Histogram<f64> {
    meter()
        .f64_histogram("mesh_health.refresh.duration")
        .with_description("Health refresh cycle duration in milliseconds")
        .with_unit("ms")
        .build()
}

pub static HEALTH_STATUS: OnceLock<Gauge<u64>> = OnceLock::new();
pub static REFRESH_NAMESPACES: OnceLock<Gauge<u64>> = OnceLock::new();
pub static REFRESH_CYCLES_TOTAL: OnceLock<Counter<u64>> = OnceLock::new();
pub static REFRESH_ERRORS_TOTAL: OnceLock<Counter<u64>> = OnceLock::new();
pub static REFRESH_DURATION: OnceLock<Histogram<f64>> = OnceLock::new();

/// Initialize all health monitor instruments
pub fn init() {
    HEALTH_STATUS.get_or_init(health_status);
    REFRESH_NAMESPACES.get_or_init(refresh_namespaces);
    REFRESH_CYCLES_TOTAL.get_or_init(refresh_cycles_total);
    REFRESH_ERRORS_TOTAL.get_or_init(refresh_errors_total);
    REFRESH_DURATION.get_or_init(refresh_duration);

    tracing::debug!("Health monitor metrics initialized");
}

/// Label sets for one item: one entry per possible state, paired with 1 for
/// the active state and 0 otherwise.
pub fn status_state_samples(
    cluster: &str,
    namespace: &str,
    health_type: HealthType,
    name: &str,
    status: HealthStatus,
) -> Vec<(u64, Vec<KeyValue>)> {
    HealthStatus::ALL
        .iter()
        .map(|state| {
            let labels = vec![
                KeyValue::new("cluster", cluster.to_string()),
                KeyValue::new("namespace", namespace.to_string()),
                KeyValue::new("health_type", health_type.as_str()),
                KeyValue::new("name", name.to_string()),
                KeyValue::new("state", state.as_str()),
            ];
            (u64::from(*state == status), labels)
        })
        .collect()
}

/// Export the state set of one item
pub fn record_item_status(cluster: &str, namespace: &str, health_type: HealthType, name: &str, status: HealthStatus) {
    if let Some(gauge) = HEALTH_STATUS.get() {
        for (value, labels) in status_state_samples(cluster, namespace, health_type, name, status) {
            gauge.record(value, &labels);
        }
    }
}

/// Record one refresh cycle's outcome, duration and counts
pub fn record_refresh_cycle(outcome: &'static str, duration_ms: f64, namespaces: u64, errors: u64) {
    if let Some(counter) = REFRESH_CYCLES_TOTAL.get() {
        counter.add(1, &[KeyValue::new("outcome", outcome)]);
    }
    if let Some(histogram) = REFRESH_DURATION.get() {
        histogram.record(duration_ms, &[]);
    }
    if let Some(gauge) = REFRESH_NAMESPACES.get() {
        gauge.record(namespaces, &[]);
    }
    if errors > 0 {
        if let Some(counter) = REFRESH_ERRORS_TOTAL.get() {
            counter.add(errors, &[]);
        }
    }
}
