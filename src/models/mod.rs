//! # Health Models
//!
//! Data shapes shared by the calculator, the monitor and the cache: graded
//! statuses, raw request counters, workload replica state and the
//! per-namespace snapshot.

pub mod health;
pub mod requests;
pub mod status;
pub mod workload;

pub use health::{
    AppHealth, CachedHealthData, CalculatedHealth, ClusterRef, EntityHealth, HealthType, Namespace,
    NamespaceAppHealth, NamespaceServiceHealth, NamespaceWorkloadHealth, ServiceHealth,
    WorkloadHealth,
};
pub use requests::{ProtocolCodes, RequestHealth};
pub use status::{merge_health_status, HealthStatus};
pub use workload::{workload_status_health, WorkloadStatus};
