//! # Health Cache
//!
//! The shared store the monitor writes per-namespace snapshots into and other
//! subsystems read from. Writes for different `(cluster, namespace)` keys are
//! independent and never block each other.
//!
//! Entries are never purged here: a namespace that stops being refreshed keeps
//! its last snapshot, and readers decide staleness through
//! [`CachedHealthData::is_stale`].

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

use crate::models::{CachedHealthData, ClusterRef};

/// Cluster list and health snapshot store
pub trait HealthCache: Send + Sync {
    /// Clusters currently visible to the process
    fn get_clusters(&self) -> Vec<ClusterRef>;

    /// Replace the snapshot for one namespace
    fn set_health(&self, cluster: &str, namespace: &str, data: CachedHealthData);

    fn get_health(&self, cluster: &str, namespace: &str) -> Option<CachedHealthData>;
}

/// In-process [`HealthCache`] backed by a sharded map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHealthCache {
    clusters: Arc<RwLock<Vec<ClusterRef>>>,
    health: Arc<DashMap<(String, String), CachedHealthData>>,
}

impl InMemoryHealthCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clusters(clusters: Vec<ClusterRef>) -> Self {
        let cache = Self::new();
        cache.set_clusters(clusters);
        cache
    }

    pub fn set_clusters(&self, clusters: Vec<ClusterRef>) {
        *self.clusters.write() = clusters;
    }

    /// Number of cached `(cluster, namespace)` snapshots
    pub fn len(&self) -> usize {
        self.health.len()
    }

    pub fn is_empty(&self) -> bool {
        self.health.is_empty()
    }

    /// Every snapshot held for one cluster
    pub fn cluster_health(&self, cluster: &str) -> Vec<CachedHealthData> {
        self.health
            .iter()
            .filter(|entry| entry.key().0 == cluster)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl HealthCache for InMemoryHealthCache {
    fn get_clusters(&self) -> Vec<ClusterRef> {
        self.clusters.read().clone()
    }

    fn set_health(&self, cluster: &str, namespace: &str, data: CachedHealthData) {
        debug!(cluster = cluster, namespace = namespace, computed_at = %data.computed_at, "Caching namespace health");
        self.health.insert((cluster.to_string(), namespace.to_string()), data);
    }

    fn get_health(&self, cluster: &str, namespace: &str) -> Option<CachedHealthData> {
        self.health
            .get(&(cluster.to_string(), namespace.to_string()))
            .map(|entry| entry.value().clone())
    }
}
