#![allow(clippy::doc_markdown)] // Allow technical terms like OpenTelemetry, gRPC in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Mesh Health
//!
//! Health-state computation and background refresh for service-mesh
//! applications, services and workloads.
//!
//! ## Overview
//!
//! Given raw request counters and workload replica state pulled from a mesh,
//! the crate derives a graded verdict (Healthy, Not Ready, Degraded, Failure,
//! or NA when there is no data) per entity, using an ordered list of
//! regex-matched tolerance policies, and keeps a multi-cluster cache of those
//! verdicts fresh on a background schedule.
//!
//! ## Module Organization
//!
//! - [`config`] - Policies, scheduler timing and the file/environment loader
//! - [`models`] - Statuses, raw counters, replica state and cache snapshots
//! - [`health`] - Policy matcher, annotation overrides, calculator, cache and monitor
//! - [`metrics`] - OpenTelemetry instruments exported by the monitor
//! - [`error`] - Crate-wide error type
//! - [`logging`] - Structured logging initialisation
//!
//! ## Quick Start
//!
//! ```rust
//! use mesh_health::config::{HealthConfig, Tolerance, Rate};
//! use mesh_health::health::HealthCalculator;
//! use mesh_health::models::{HealthStatus, RequestHealth, ServiceHealth};
//!
//! let mut config = HealthConfig {
//!     rate: vec![Rate {
//!         namespace: "bookinfo".into(),
//!         tolerance: vec![Tolerance::new("5XX", 10.0, 20.0, "http", ".*")],
//!         ..Rate::default()
//!     }],
//!     ..HealthConfig::default()
//! };
//! config.add_health_default();
//!
//! let calculator = HealthCalculator::from_config(&config);
//!
//! let mut requests = RequestHealth::new();
//! requests.record("inbound", "http", "200", 100.0).record("inbound", "http", "500", 15.0);
//! let service = ServiceHealth { requests, status: None };
//!
//! let health = calculator.calculate_service_health("bookinfo", "reviews", Some(&service), None);
//! assert_eq!(health.status, HealthStatus::Degraded);
//! ```
//!
//! ## Testing
//!
//! Unit tests live next to the code; integration tests under `tests/` drive
//! the monitor against in-memory collaborators.

pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod models;

pub use config::{ConfigManager, MeshHealthConfig};
pub use error::{MeshHealthError, Result};
pub use health::{
    CancellationSignal, HealthCalculator, HealthMonitor, HealthRateMatcher, InMemoryHealthCache, RefreshSummary,
};
pub use models::{CalculatedHealth, HealthStatus};
