//! In-memory collaborators for driving the health monitor in tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mesh_health::error::{MeshHealthError, Result};
use mesh_health::health::{
    ClientFactory, HealthLayer, HealthService, LayerFactory, NamespaceHealthCriteria, NamespaceService,
    SharedLayerFactory,
};
use mesh_health::models::{
    AppHealth, HealthType, Namespace, NamespaceAppHealth, NamespaceServiceHealth, NamespaceWorkloadHealth,
    ServiceHealth, WorkloadHealth,
};

type Key = (String, String);

fn key(cluster: &str, namespace: &str) -> Key {
    (cluster.to_string(), namespace.to_string())
}

/// Service-account clients for a fixed set of clusters
#[derive(Debug, Default)]
pub struct FakeClients {
    clusters: HashSet<String>,
}

impl FakeClients {
    pub fn for_clusters(clusters: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            clusters: clusters.iter().map(|c| c.to_string()).collect(),
        })
    }
}

impl ClientFactory for FakeClients {
    fn has_sa_client(&self, cluster: &str) -> bool {
        self.clusters.contains(cluster)
    }
}

#[derive(Debug, Default)]
pub struct FakeNamespaces {
    namespaces: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeNamespaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(mut self, cluster: &str, namespaces: &[&str]) -> Self {
        self.namespaces
            .insert(cluster.to_string(), namespaces.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn failing_for(mut self, cluster: &str) -> Self {
        self.failing.insert(cluster.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NamespaceService for FakeNamespaces {
    async fn get_cluster_namespaces(&self, cluster: &str) -> Result<Vec<Namespace>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(cluster) {
            return Err(MeshHealthError::Namespaces {
                cluster: cluster.to_string(),
                reason: "forbidden".to_string(),
            });
        }
        Ok(self
            .namespaces
            .get(cluster)
            .map(|names| names.iter().map(|n| Namespace::new(cluster, n.as_str())).collect())
            .unwrap_or_default())
    }
}

/// Raw health keyed by (cluster, namespace), with injectable failures and
/// latency. Records every criteria it was called with.
#[derive(Debug, Default)]
pub struct FakeHealthService {
    apps: HashMap<Key, NamespaceAppHealth>,
    services: HashMap<Key, NamespaceServiceHealth>,
    workloads: HashMap<Key, NamespaceWorkloadHealth>,
    failing: HashSet<(String, String, HealthType)>,
    delay: Option<Duration>,
    criteria: Mutex<Vec<NamespaceHealthCriteria>>,
}

impl FakeHealthService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app(mut self, cluster: &str, namespace: &str, name: &str, health: AppHealth) -> Self {
        self.apps
            .entry(key(cluster, namespace))
            .or_default()
            .insert(name.to_string(), health);
        self
    }

    pub fn with_service(mut self, cluster: &str, namespace: &str, name: &str, health: ServiceHealth) -> Self {
        self.services
            .entry(key(cluster, namespace))
            .or_default()
            .insert(name.to_string(), health);
        self
    }

    pub fn with_workload(mut self, cluster: &str, namespace: &str, name: &str, health: WorkloadHealth) -> Self {
        self.workloads
            .entry(key(cluster, namespace))
            .or_default()
            .insert(name.to_string(), health);
        self
    }

    pub fn failing(mut self, cluster: &str, namespace: &str, kinds: &[HealthType]) -> Self {
        for kind in kinds {
            self.failing
                .insert((cluster.to_string(), namespace.to_string(), *kind));
        }
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn criteria(&self) -> Vec<NamespaceHealthCriteria> {
        self.criteria.lock().clone()
    }

    async fn fetch<T: Clone + Default>(
        &self,
        kind: HealthType,
        criteria: &NamespaceHealthCriteria,
        source: &HashMap<Key, T>,
    ) -> Result<T> {
        self.criteria.lock().push(criteria.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self
            .failing
            .contains(&(criteria.cluster.clone(), criteria.namespace.clone(), kind))
        {
            return Err(MeshHealthError::health_fetch(
                kind.as_str(),
                &criteria.cluster,
                &criteria.namespace,
                "metrics backend unavailable",
            ));
        }
        Ok(source
            .get(&key(&criteria.cluster, &criteria.namespace))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl HealthService for FakeHealthService {
    async fn get_namespace_app_health(&self, criteria: &NamespaceHealthCriteria) -> Result<NamespaceAppHealth> {
        self.fetch(HealthType::App, criteria, &self.apps).await
    }

    async fn get_namespace_service_health(&self, criteria: &NamespaceHealthCriteria) -> Result<NamespaceServiceHealth> {
        self.fetch(HealthType::Service, criteria, &self.services).await
    }

    async fn get_namespace_workload_health(
        &self,
        criteria: &NamespaceHealthCriteria,
    ) -> Result<NamespaceWorkloadHealth> {
        self.fetch(HealthType::Workload, criteria, &self.workloads).await
    }
}

/// Layer factory counting how many layers it handed out
pub struct CountingLayerFactory {
    inner: SharedLayerFactory,
    created: AtomicUsize,
    fail: bool,
}

impl CountingLayerFactory {
    pub fn new(namespaces: Arc<FakeNamespaces>, health: Arc<FakeHealthService>) -> Arc<Self> {
        Arc::new(Self {
            inner: SharedLayerFactory::new(namespaces, health),
            created: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing(namespaces: Arc<FakeNamespaces>, health: Arc<FakeHealthService>) -> Arc<Self> {
        Arc::new(Self {
            inner: SharedLayerFactory::new(namespaces, health),
            created: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl LayerFactory for CountingLayerFactory {
    fn create_layer(&self) -> Result<HealthLayer> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MeshHealthError::LayerConstruction(
                "unsupported discovery backend".to_string(),
            ));
        }
        self.inner.create_layer()
    }
}
