//! # Collaborator Layer
//!
//! The narrow contracts the monitor consumes from the rest of the process:
//! namespace discovery, raw health acquisition and per-cluster client
//! availability. A [`HealthLayer`] is built once per refresh cycle through a
//! [`LayerFactory`] and reused for every namespace of every cluster in that
//! cycle, so the whole cycle sees one consistent set of clients.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Namespace, NamespaceAppHealth, NamespaceServiceHealth, NamespaceWorkloadHealth};

/// Query parameters for one namespace's raw health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceHealthCriteria {
    pub cluster: String,
    pub namespace: String,
    /// Metrics query window, e.g. `"5m"`
    pub rate_interval: String,
    pub query_time: DateTime<Utc>,
    pub include_metrics: bool,
}

/// Lists namespaces visible to a cluster, already access-control filtered.
#[async_trait]
pub trait NamespaceService: Send + Sync {
    async fn get_cluster_namespaces(&self, cluster: &str) -> Result<Vec<Namespace>>;
}

/// Fetches raw (uncalculated) health for every entity of a namespace.
#[async_trait]
pub trait HealthService: Send + Sync {
    async fn get_namespace_app_health(&self, criteria: &NamespaceHealthCriteria) -> Result<NamespaceAppHealth>;

    async fn get_namespace_service_health(
        &self,
        criteria: &NamespaceHealthCriteria,
    ) -> Result<NamespaceServiceHealth>;

    async fn get_namespace_workload_health(
        &self,
        criteria: &NamespaceHealthCriteria,
    ) -> Result<NamespaceWorkloadHealth>;
}

/// Reports which clusters have a service-account client configured.
pub trait ClientFactory: Send + Sync {
    fn has_sa_client(&self, cluster: &str) -> bool;
}

/// Collaborators used for one refresh cycle
#[derive(Clone)]
pub struct HealthLayer {
    pub namespaces: Arc<dyn NamespaceService>,
    pub health: Arc<dyn HealthService>,
}

impl fmt::Debug for HealthLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthLayer").finish_non_exhaustive()
    }
}

/// Builds the per-cycle [`HealthLayer`].
///
/// An error here is fatal for the cycle: the monitor aborts it and retries on
/// the next tick.
pub trait LayerFactory: Send + Sync {
    fn create_layer(&self) -> Result<HealthLayer>;
}

/// [`LayerFactory`] handing out the same long-lived collaborators every cycle.
#[derive(Clone)]
pub struct SharedLayerFactory {
    layer: HealthLayer,
}

impl SharedLayerFactory {
    pub fn new(namespaces: Arc<dyn NamespaceService>, health: Arc<dyn HealthService>) -> Self {
        Self {
            layer: HealthLayer { namespaces, health },
        }
    }
}

impl LayerFactory for SharedLayerFactory {
    fn create_layer(&self) -> Result<HealthLayer> {
        Ok(self.layer.clone())
    }
}

impl fmt::Debug for SharedLayerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLayerFactory").finish_non_exhaustive()
    }
}
