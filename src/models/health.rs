//! Raw per-entity health and the per-namespace snapshot written to the cache.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::requests::RequestHealth;
use super::status::HealthStatus;
use super::workload::WorkloadStatus;

/// The three entity kinds health is computed for. The string form is the
/// `kind` matched by rate policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthType {
    App,
    Service,
    Workload,
}

impl HealthType {
    pub const ALL: [HealthType; 3] = [HealthType::App, HealthType::Service, HealthType::Workload];

    pub const fn as_str(self) -> &'static str {
        match self {
            HealthType::App => "app",
            HealthType::Service => "service",
            HealthType::Workload => "workload",
        }
    }
}

impl std::fmt::Display for HealthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final verdict for one entity.
///
/// `error_ratio` is a percentage in `[0, 100]`, or `-1` when `status` is
/// [`HealthStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedHealth {
    pub status: HealthStatus,
    pub error_ratio: f64,
}

impl CalculatedHealth {
    pub const fn unknown() -> Self {
        Self {
            status: HealthStatus::Unknown,
            error_ratio: -1.0,
        }
    }

    pub const fn new(status: HealthStatus, error_ratio: f64) -> Self {
        Self { status, error_ratio }
    }
}

impl Default for CalculatedHealth {
    fn default() -> Self {
        Self::unknown()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppHealth {
    #[serde(default)]
    pub workload_statuses: Vec<WorkloadStatus>,
    #[serde(default)]
    pub requests: RequestHealth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CalculatedHealth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    #[serde(default)]
    pub requests: RequestHealth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CalculatedHealth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadHealth {
    #[serde(default)]
    pub workload_status: Option<WorkloadStatus>,
    #[serde(default)]
    pub requests: RequestHealth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CalculatedHealth>,
}

/// Access shared by the three raw-health shapes.
pub trait EntityHealth {
    fn requests(&self) -> &RequestHealth;
    fn status(&self) -> Option<&CalculatedHealth>;
    fn set_status(&mut self, status: CalculatedHealth);

    fn annotations(&self) -> &HashMap<String, String> {
        &self.requests().health_annotations
    }
}

macro_rules! impl_entity_health {
    ($($ty:ty),+) => {
        $(
            impl EntityHealth for $ty {
                fn requests(&self) -> &RequestHealth {
                    &self.requests
                }

                fn status(&self) -> Option<&CalculatedHealth> {
                    self.status.as_ref()
                }

                fn set_status(&mut self, status: CalculatedHealth) {
                    self.status = Some(status);
                }
            }
        )+
    };
}

impl_entity_health!(AppHealth, ServiceHealth, WorkloadHealth);

/// Entity name -> raw health, for one namespace
pub type NamespaceAppHealth = HashMap<String, AppHealth>;
pub type NamespaceServiceHealth = HashMap<String, ServiceHealth>;
pub type NamespaceWorkloadHealth = HashMap<String, WorkloadHealth>;

/// One cache entry: everything computed for a (cluster, namespace) pair in a
/// single refresh cycle. Replaces the previous entry wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedHealthData {
    pub cluster: String,
    pub namespace: String,
    pub computed_at: DateTime<Utc>,
    /// Metrics query window the counters were taken over, e.g. `"5m"`
    pub duration: String,
    pub app_health: NamespaceAppHealth,
    pub service_health: NamespaceServiceHealth,
    pub workload_health: NamespaceWorkloadHealth,
}

impl CachedHealthData {
    pub fn age(&self, now: DateTime<Utc>) -> ChronoDuration {
        now.signed_duration_since(self.computed_at)
    }

    /// True when the snapshot is older than `max_age` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: std::time::Duration) -> bool {
        match ChronoDuration::from_std(max_age) {
            Ok(max_age) => self.age(now) > max_age,
            Err(_) => false,
        }
    }
}

/// A cluster known to the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterRef {
    pub name: String,
}

impl ClusterRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub cluster: String,
    pub name: String,
}

impl Namespace {
    pub fn new(cluster: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(computed_at: DateTime<Utc>) -> CachedHealthData {
        CachedHealthData {
            cluster: "east".into(),
            namespace: "bookinfo".into(),
            computed_at,
            duration: "5m".into(),
            app_health: HashMap::new(),
            service_health: HashMap::new(),
            workload_health: HashMap::new(),
        }
    }

    #[test]
    fn test_staleness() {
        let now = Utc::now();
        let data = snapshot(now - ChronoDuration::seconds(300));

        assert_eq!(data.age(now).num_seconds(), 300);
        assert!(data.is_stale(now, std::time::Duration::from_secs(120)));
        assert!(!data.is_stale(now, std::time::Duration::from_secs(600)));
    }

    #[test]
    fn test_unknown_health_sentinel() {
        let unknown = CalculatedHealth::default();
        assert_eq!(unknown.status, HealthStatus::Unknown);
        assert_eq!(unknown.error_ratio, -1.0);
    }

    #[test]
    fn test_set_status_through_trait() {
        let mut svc = ServiceHealth::default();
        assert!(EntityHealth::status(&svc).is_none());
        svc.set_status(CalculatedHealth::new(HealthStatus::Healthy, 0.0));
        assert_eq!(svc.status.map(|s| s.status), Some(HealthStatus::Healthy));
    }

    #[test]
    fn test_status_omitted_when_unset() {
        let json = serde_json::to_value(WorkloadHealth::default()).unwrap();
        assert!(json.get("status").is_none());
        assert!(json.get("workloadStatus").is_some());
    }
}
