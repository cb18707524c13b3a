//! # Health Monitor
//!
//! Background task that keeps the health cache fresh. Every refresh interval it
//! walks every cluster known to the cache and every namespace visible to that
//! cluster, fetches raw health through the per-cycle [`HealthLayer`], runs the
//! [`HealthCalculator`] over it and writes one [`CachedHealthData`] snapshot
//! per namespace.
//!
//! Everything inside a cycle runs sequentially on the monitor task, so at most
//! one backend request is in flight at a time. Each cycle is bounded by the
//! configured timeout, and cycles never overlap.
//!
//! ## Lifecycle
//!
//! ```ignore
//! let monitor = HealthMonitor::new(cache, clients, layers, config.as_ref());
//! let signal = CancellationSignal::new();
//!
//! // Primes the cache, then refreshes in the background
//! let handle = monitor.start(signal.clone()).await;
//!
//! // Terminal: the loop exits and never restarts
//! signal.cancel();
//! handle.await?;
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::cache::HealthCache;
use super::calculator::{HealthCalculator, NamespaceAnnotations};
use super::layer::{ClientFactory, HealthLayer, LayerFactory, NamespaceHealthCriteria};
use super::shutdown::CancellationSignal;
use crate::config::{format_duration, MeshHealthConfig, ResolvedCompute};
use crate::error::{MeshHealthError, Result};
use crate::metrics::health as health_metrics;
use crate::models::{CachedHealthData, CalculatedHealth, EntityHealth, HealthType};

/// Safety margin applied to the query window after a stalled or late cycle
const DURATION_SAFETY_FACTOR: f64 = 1.1;

/// Counts from one completed refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub clusters: usize,
    pub namespaces: usize,
    pub errors: usize,
    pub elapsed: Duration,
    /// Query window used for the cycle
    pub duration: String,
}

impl RefreshSummary {
    /// No cluster was visible, so nothing was refreshed
    pub fn is_skipped(&self) -> bool {
        self.clusters == 0
    }
}

/// Outcome of one cluster pass
#[derive(Debug, Default, Clone, Copy)]
struct ClusterPass {
    namespaces: usize,
    errors: usize,
}

pub struct HealthMonitor {
    cache: Arc<dyn HealthCache>,
    clients: Arc<dyn ClientFactory>,
    layers: Arc<dyn LayerFactory>,
    calculator: HealthCalculator,
    compute: ResolvedCompute,
    metrics_enabled: bool,
    /// Start time of the last completed cycle; written only by the monitor
    last_run: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("compute", &self.compute)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("rates", &self.calculator.matcher().len())
            .field("last_run", &self.last_run)
            .finish()
    }
}

impl HealthMonitor {
    /// Build a monitor from loaded configuration.
    ///
    /// Compiles the rate policies and resolves the scheduler timing; invalid
    /// timing values fall back to their defaults with a warning.
    pub fn new(
        cache: Arc<dyn HealthCache>,
        clients: Arc<dyn ClientFactory>,
        layers: Arc<dyn LayerFactory>,
        config: &MeshHealthConfig,
    ) -> Self {
        Self {
            cache,
            clients,
            layers,
            calculator: HealthCalculator::from_config(&config.health),
            compute: config.health.compute.resolve(),
            metrics_enabled: config.observability.metrics_enabled,
            last_run: None,
        }
    }

    /// Share an existing calculator (and its compiled policies) with other
    /// request paths.
    pub fn with_calculator(mut self, calculator: HealthCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn calculator(&self) -> &HealthCalculator {
        &self.calculator
    }

    pub fn compute(&self) -> &ResolvedCompute {
        &self.compute
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    /// Prime the cache with one bounded refresh, then refresh on every tick
    /// of the refresh interval until `signal` is cancelled.
    pub async fn start(mut self, signal: CancellationSignal) -> JoinHandle<()> {
        let period = self.compute.refresh_interval;

        info!(
            refresh_interval = ?period,
            timeout = ?self.compute.timeout,
            duration = %self.compute.duration_str,
            rates = self.calculator.matcher().len(),
            metrics_enabled = self.metrics_enabled,
            "Starting health monitor"
        );

        if self.metrics_enabled {
            health_metrics::init();
        }

        self.run_cycle(&signal, "initial").await;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = signal.cancelled() => {
                        info!("Stopping health monitor");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.run_cycle(&signal, "scheduled").await;
                    }
                }
            }
        })
    }

    /// One timeout-bounded refresh. Failures are logged, never propagated.
    async fn run_cycle(&mut self, signal: &CancellationSignal, trigger: &'static str) {
        let timeout = self.compute.timeout;
        let started = Instant::now();

        let result = tokio::select! {
            refreshed = tokio::time::timeout(timeout, self.refresh_health(signal)) => {
                refreshed.unwrap_or(Err(MeshHealthError::Timeout(timeout)))
            }
            _ = signal.cancelled() => Err(MeshHealthError::Cancelled),
        };

        match result {
            Ok(_) => {}
            Err(MeshHealthError::Cancelled) => {
                info!(trigger = trigger, "Health refresh cancelled");
                self.record_cycle("cancelled", started.elapsed(), 0, 0);
            }
            Err(e @ MeshHealthError::Timeout(_)) => {
                error!(trigger = trigger, error = %e, "Health refresh timed out");
                self.record_cycle("timeout", started.elapsed(), 0, 0);
            }
            Err(e) => {
                // failure metrics were recorded inside refresh_health
                error!(trigger = trigger, error = %e, "Health refresh failed");
            }
        }
    }

    /// Run a single refresh over every cluster and namespace.
    ///
    /// Per-cluster and per-namespace failures are counted in the summary. Only
    /// a layer construction failure or cancellation is returned as an error.
    pub async fn refresh_health(&mut self, signal: &CancellationSignal) -> Result<RefreshSummary> {
        let cycle_start = Utc::now();
        let started = Instant::now();
        debug!("Starting health refresh");

        let duration = self.calculate_duration(cycle_start);

        let layer = match self.layers.create_layer() {
            Ok(layer) => layer,
            Err(e) => {
                self.record_cycle("failed", started.elapsed(), 0, 0);
                return Err(match e {
                    MeshHealthError::LayerConstruction(_) => e,
                    other => MeshHealthError::LayerConstruction(other.to_string()),
                });
            }
        };

        let clusters = self.cache.get_clusters();
        if clusters.is_empty() {
            warn!("No clusters found, skipping health refresh");
            self.record_cycle("skipped", started.elapsed(), 0, 0);
            return Ok(RefreshSummary {
                clusters: 0,
                namespaces: 0,
                errors: 0,
                elapsed: started.elapsed(),
                duration,
            });
        }

        let mut namespaces = 0;
        let mut errors = 0;
        for cluster in &clusters {
            if signal.is_cancelled() {
                return Err(MeshHealthError::Cancelled);
            }
            let pass = self.refresh_cluster(&layer, &cluster.name, &duration, signal).await;
            namespaces += pass.namespaces;
            errors += pass.errors;
        }
        if signal.is_cancelled() {
            return Err(MeshHealthError::Cancelled);
        }

        self.last_run = Some(cycle_start);
        let elapsed = started.elapsed();

        info!(
            clusters = clusters.len(),
            namespaces = namespaces,
            errors = errors,
            elapsed_ms = elapsed.as_millis() as u64,
            health_duration = %duration,
            "Health refresh completed"
        );
        self.record_cycle("success", elapsed, namespaces, errors);

        Ok(RefreshSummary {
            clusters: clusters.len(),
            namespaces,
            errors,
            elapsed,
            duration,
        })
    }

    async fn refresh_cluster(
        &self,
        layer: &HealthLayer,
        cluster: &str,
        duration: &str,
        signal: &CancellationSignal,
    ) -> ClusterPass {
        debug!(cluster = cluster, "Refreshing health for cluster");

        if !self.clients.has_sa_client(cluster) {
            let e = MeshHealthError::MissingClient {
                cluster: cluster.to_string(),
            };
            error!(cluster = cluster, error = %e, "Skipping cluster");
            return ClusterPass { namespaces: 0, errors: 1 };
        }

        let namespaces = match layer.namespaces.get_cluster_namespaces(cluster).await {
            Ok(namespaces) => namespaces,
            Err(e) => {
                error!(cluster = cluster, error = %e, "Failed to get namespaces for cluster");
                return ClusterPass { namespaces: 0, errors: 1 };
            }
        };

        let mut pass = ClusterPass::default();
        for namespace in &namespaces {
            if signal.is_cancelled() {
                break;
            }
            pass.namespaces += 1;
            if let Err(e) = self.refresh_namespace(layer, cluster, &namespace.name, duration).await {
                warn!(cluster = cluster, namespace = %namespace.name, error = %e, "Failed to refresh health for namespace");
                pass.errors += 1;
            }
        }
        pass
    }

    /// Fetch, calculate and cache one namespace. Errors only when all three
    /// raw-health fetches fail; the previous snapshot then stays in place.
    async fn refresh_namespace(&self, layer: &HealthLayer, cluster: &str, namespace: &str, duration: &str) -> Result<()> {
        debug!(cluster = cluster, namespace = namespace, "Computing health for namespace");

        let query_time = Utc::now();
        let criteria = NamespaceHealthCriteria {
            cluster: cluster.to_string(),
            namespace: namespace.to_string(),
            rate_interval: duration.to_string(),
            query_time,
            include_metrics: true,
        };

        let apps = layer.health.get_namespace_app_health(&criteria).await;
        let services = layer.health.get_namespace_service_health(&criteria).await;
        let workloads = layer.health.get_namespace_workload_health(&criteria).await;

        let (mut app_health, mut service_health, mut workload_health) = match (apps, services, workloads) {
            (Err(app), Err(service), Err(workload)) => {
                return Err(MeshHealthError::AllHealthComputationsFailed {
                    cluster: cluster.to_string(),
                    namespace: namespace.to_string(),
                    app: app.to_string(),
                    service: service.to_string(),
                    workload: workload.to_string(),
                });
            }
            (apps, services, workloads) => (
                partial(apps, HealthType::App, cluster, namespace),
                partial(services, HealthType::Service, cluster, namespace),
                partial(workloads, HealthType::Workload, cluster, namespace),
            ),
        };

        let statuses = self
            .calculator
            .calculate_namespace_app_health(namespace, &app_health, &annotations_of(&app_health));
        attach_statuses(&mut app_health, statuses);

        let statuses = self.calculator.calculate_namespace_service_health(
            namespace,
            &service_health,
            &annotations_of(&service_health),
        );
        attach_statuses(&mut service_health, statuses);

        let statuses = self.calculator.calculate_namespace_workload_health(
            namespace,
            &workload_health,
            &annotations_of(&workload_health),
        );
        attach_statuses(&mut workload_health, statuses);

        if self.metrics_enabled {
            export_statuses(cluster, namespace, HealthType::App, &app_health);
            export_statuses(cluster, namespace, HealthType::Service, &service_health);
            export_statuses(cluster, namespace, HealthType::Workload, &workload_health);
        }

        self.cache.set_health(
            cluster,
            namespace,
            CachedHealthData {
                cluster: cluster.to_string(),
                namespace: namespace.to_string(),
                computed_at: query_time,
                duration: duration.to_string(),
                app_health,
                service_health,
                workload_health,
            },
        );
        Ok(())
    }

    /// Metrics query window for a cycle starting at `now`.
    ///
    /// The configured window is used on the first cycle and whenever the gap
    /// since the previous cycle fits inside it. A longer gap widens the window
    /// to the gap plus 10% so no traffic falls between two cycles.
    pub fn calculate_duration(&self, now: DateTime<Utc>) -> String {
        let Some(last_run) = self.last_run else {
            return self.compute.duration_str.clone();
        };

        let gap = now.signed_duration_since(last_run).to_std().unwrap_or(Duration::ZERO);
        if gap <= self.compute.duration {
            return self.compute.duration_str.clone();
        }

        let widened = Duration::from_secs_f64((gap.as_secs_f64() * DURATION_SAFETY_FACTOR).round());
        debug!(gap_secs = gap.as_secs(), widened = %format_duration(widened), "Widening health query window");
        format_duration(widened)
    }

    fn record_cycle(&self, outcome: &'static str, elapsed: Duration, namespaces: usize, errors: usize) {
        if self.metrics_enabled {
            health_metrics::record_refresh_cycle(
                outcome,
                elapsed.as_secs_f64() * 1000.0,
                namespaces as u64,
                errors as u64,
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn set_last_run(&mut self, last_run: Option<DateTime<Utc>>) {
        self.last_run = last_run;
    }
}

/// Keep the data of a successful fetch; log and substitute an empty map for a
/// failed one.
fn partial<T: Default>(result: Result<T>, kind: HealthType, cluster: &str, namespace: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!(cluster = cluster, namespace = namespace, kind = %kind, error = %e, "Health computation failed");
        T::default()
    })
}

fn annotations_of<T: EntityHealth>(items: &HashMap<String, T>) -> NamespaceAnnotations {
    items
        .iter()
        .filter(|(_, item)| !item.annotations().is_empty())
        .map(|(name, item)| (name.clone(), item.annotations().clone()))
        .collect()
}

fn attach_statuses<T: EntityHealth>(items: &mut HashMap<String, T>, statuses: HashMap<String, CalculatedHealth>) {
    for (name, status) in statuses {
        if let Some(item) = items.get_mut(&name) {
            item.set_status(status);
        }
    }
}

fn export_statuses<T: EntityHealth>(cluster: &str, namespace: &str, kind: HealthType, items: &HashMap<String, T>) {
    for (name, item) in items {
        if let Some(status) = item.status() {
            health_metrics::record_item_status(cluster, namespace, kind, name, status.status);
        }
    }
}
