//! # Health Pipeline
//!
//! Policy compilation, verdict calculation and the background refresh loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   tolerances   ┌──────────────────┐
//! │ HealthRateMatcher│───────────────>│ HealthCalculator │
//! │ (+ annotations)  │                └────────▲─────────┘
//! └──────────────────┘                         │ raw health
//!                                     ┌────────┴─────────┐   snapshots   ┌─────────────┐
//!                                     │  HealthMonitor   │──────────────>│ HealthCache │
//!                                     │ (background loop)│               └─────────────┘
//!                                     └────────┬─────────┘
//!                                              │ per-cycle
//!                                     ┌────────▼─────────┐
//!                                     │   HealthLayer    │ namespaces, raw counters
//!                                     └──────────────────┘
//! ```
//!
//! The matcher is compiled once and is read-only afterwards, so it is shared
//! through an `Arc` with any request path that needs tolerances. The monitor
//! is the single writer of the cache and of its own `last_run` state.

pub mod annotation;
pub mod cache;
pub mod calculator;
pub mod layer;
pub mod matcher;
pub mod monitor;
pub mod shutdown;

pub use annotation::{parse_health_annotation, RATE_HEALTH_ANNOTATION};
pub use cache::{HealthCache, InMemoryHealthCache};
pub use calculator::{apply_thresholds, HealthCalculator, NamespaceAnnotations};
pub use layer::{
    ClientFactory, HealthLayer, HealthService, LayerFactory, NamespaceHealthCriteria, NamespaceService,
    SharedLayerFactory,
};
pub use matcher::{CompiledRate, CompiledTolerance, HealthRateMatcher};
pub use monitor::{HealthMonitor, RefreshSummary};
pub use shutdown::CancellationSignal;
