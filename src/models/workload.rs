//! Replica and proxy-sync state of a workload.

use serde::{Deserialize, Serialize};

use super::status::HealthStatus;

/// Replica counts as reported by the workload controller.
///
/// `synced_proxies` is `-1` when the workload has no sidecar (gateways,
/// out-of-mesh workloads) and proxy sync does not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadStatus {
    pub name: String,
    pub desired_replicas: i32,
    pub current_replicas: i32,
    pub available_replicas: i32,
    pub synced_proxies: i32,
}

impl WorkloadStatus {
    pub fn new(name: impl Into<String>, desired: i32, current: i32, available: i32, synced: i32) -> Self {
        Self {
            name: name.into(),
            desired_replicas: desired,
            current_replicas: current,
            available_replicas: available,
            synced_proxies: synced,
        }
    }

    /// Structural status derived from replica counts alone.
    pub fn health(&self) -> HealthStatus {
        let desired = self.desired_replicas;
        let current = self.current_replicas;
        let available = self.available_replicas;

        if desired == 0 {
            return HealthStatus::NotReady;
        }
        if desired > 0 && current > 0 && available > 0 && (current < desired || available < desired) {
            return HealthStatus::Degraded;
        }
        if desired > 0 && available == 0 {
            return HealthStatus::Failure;
        }
        // pods still pending or terminating
        if desired == available && available != current {
            return HealthStatus::Failure;
        }
        if self.synced_proxies >= 0 && self.synced_proxies < desired {
            return HealthStatus::Degraded;
        }
        HealthStatus::Healthy
    }
}

/// Structural status of an optional workload; absence is `Unknown`.
pub fn workload_status_health(status: Option<&WorkloadStatus>) -> HealthStatus {
    status.map_or(HealthStatus::Unknown, WorkloadStatus::health)
}
