//! # Health Calculator
//!
//! Turns raw request counters and replica state into a [`CalculatedHealth`]
//! using the tolerances resolved for each entity (annotation override first,
//! then the compiled policy table).
//!
//! For every direction, each protocol bucket is evaluated against every
//! tolerance whose protocol and direction patterns match it. The worst
//! resulting status wins, together with the error ratio that produced it.
//! Structural status (replicas, proxy sync) is merged in last, so healthy
//! traffic never hides an unavailable workload.

use std::collections::HashMap;
use std::sync::Arc;

use super::matcher::{CompiledTolerance, HealthRateMatcher};
use crate::config::HealthConfig;
use crate::models::{
    AppHealth, CalculatedHealth, HealthStatus, HealthType, NamespaceAppHealth, NamespaceServiceHealth,
    NamespaceWorkloadHealth, ProtocolCodes, RequestHealth, ServiceHealth, WorkloadHealth,
};

/// Directions evaluated, in order
pub const DIRECTIONS: [&str; 2] = ["inbound", "outbound"];

/// Fixed bars used when an entity resolves to no tolerances at all
const SIMPLE_FAILURE_PCT: f64 = 10.0;
const SIMPLE_DEGRADED_PCT: f64 = 0.1;

/// Annotations for every entity of one kind in a namespace, keyed by name
pub type NamespaceAnnotations = HashMap<String, HashMap<String, String>>;

/// Worst `(status, ratio)` seen so far in one evaluation.
#[derive(Debug, Clone, Copy)]
struct Worst {
    status: HealthStatus,
    ratio: f64,
    has_traffic: bool,
}

impl Worst {
    const fn none() -> Self {
        Self {
            status: HealthStatus::Unknown,
            ratio: -1.0,
            has_traffic: false,
        }
    }

    // A tie on severity keeps the larger ratio so the result does not depend
    // on map iteration order.
    fn observe(&mut self, status: HealthStatus, ratio: f64) {
        if status.priority() > self.status.priority()
            || (status.priority() == self.status.priority() && ratio > self.ratio)
        {
            self.status = status;
            self.ratio = ratio;
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthCalculator {
    matcher: Arc<HealthRateMatcher>,
}

impl HealthCalculator {
    pub fn new(matcher: Arc<HealthRateMatcher>) -> Self {
        Self { matcher }
    }

    /// Compile the policy list of `config` and wrap it.
    pub fn from_config(config: &HealthConfig) -> Self {
        Self::new(Arc::new(HealthRateMatcher::new(&config.rate)))
    }

    pub fn matcher(&self) -> &Arc<HealthRateMatcher> {
        &self.matcher
    }

    /// App health: request status merged with the structural status of every
    /// workload behind the app.
    ///
    /// `annotations` defaults to the ones carried on the raw health.
    pub fn calculate_app_health(
        &self,
        namespace: &str,
        name: &str,
        health: Option<&AppHealth>,
        annotations: Option<&HashMap<String, String>>,
    ) -> CalculatedHealth {
        let Some(health) = health else {
            return CalculatedHealth::unknown();
        };
        let annotations = annotations.or(Some(&health.requests.health_annotations));
        let tolerances =
            self.matcher
                .tolerances_with_annotation_override(namespace, name, HealthType::App.as_str(), annotations);

        let (request_status, error_ratio) = self.calculate_request_status(&health.requests, &tolerances);
        let status = health
            .workload_statuses
            .iter()
            .fold(request_status, |status, ws| status.merge(ws.health()));

        finalize(status, error_ratio)
    }

    pub fn calculate_service_health(
        &self,
        namespace: &str,
        name: &str,
        health: Option<&ServiceHealth>,
        annotations: Option<&HashMap<String, String>>,
    ) -> CalculatedHealth {
        let Some(health) = health else {
            return CalculatedHealth::unknown();
        };
        let annotations = annotations.or(Some(&health.requests.health_annotations));
        let tolerances = self.matcher.tolerances_with_annotation_override(
            namespace,
            name,
            HealthType::Service.as_str(),
            annotations,
        );

        let (status, error_ratio) = self.calculate_request_status(&health.requests, &tolerances);
        finalize(status, error_ratio)
    }

    /// Workload health: the worse of structural and request status. On a tie
    /// the structural status is kept.
    pub fn calculate_workload_health(
        &self,
        namespace: &str,
        name: &str,
        health: Option<&WorkloadHealth>,
        annotations: Option<&HashMap<String, String>>,
    ) -> CalculatedHealth {
        let Some(health) = health else {
            return CalculatedHealth::unknown();
        };
        let annotations = annotations.or(Some(&health.requests.health_annotations));
        let tolerances = self.matcher.tolerances_with_annotation_override(
            namespace,
            name,
            HealthType::Workload.as_str(),
            annotations,
        );

        let (request_status, error_ratio) = self.calculate_request_status(&health.requests, &tolerances);
        let structural = crate::models::workload_status_health(health.workload_status.as_ref());

        finalize(structural.merge(request_status), error_ratio)
    }

    /// Request status over both directions.
    ///
    /// Returns `(Unknown, -1)` without any traffic, `(Healthy, 0)` when traffic
    /// exists but no tolerance applied to it.
    pub fn calculate_request_status(
        &self,
        requests: &RequestHealth,
        tolerances: &[CompiledTolerance],
    ) -> (HealthStatus, f64) {
        if tolerances.is_empty() {
            return self.calculate_simple_request_status(requests);
        }

        let mut worst = Worst::none();
        for direction in DIRECTIONS {
            let result = self.process_directional_traffic(requests.direction(direction), tolerances, direction);
            if result.has_traffic {
                worst.has_traffic = true;
                worst.observe(result.status, result.ratio);
            }
        }

        if worst.status == HealthStatus::Unknown && (worst.has_traffic || requests.has_traffic()) {
            return (HealthStatus::Healthy, 0.0);
        }
        (worst.status, worst.ratio)
    }

    fn process_directional_traffic(
        &self,
        traffic: &ProtocolCodes,
        tolerances: &[CompiledTolerance],
        direction: &str,
    ) -> Worst {
        let mut worst = Worst::none();

        let direction_tolerances: Vec<&CompiledTolerance> =
            tolerances.iter().filter(|t| t.matches_direction(direction)).collect();
        if direction_tolerances.is_empty() {
            return worst;
        }

        for (protocol, codes) in traffic {
            if codes.is_empty() {
                continue;
            }
            for tolerance in direction_tolerances.iter().filter(|t| t.matches_protocol(protocol)) {
                let (errors, total) = aggregate_matching_codes(codes, tolerance);
                if total <= 0.0 {
                    continue;
                }
                worst.has_traffic = true;
                let ratio = errors / total * 100.0;
                worst.observe(apply_thresholds(ratio, tolerance.degraded(), tolerance.failure()), ratio);
            }
        }

        worst
    }

    /// Fallback for entities without tolerances: one combined ratio against
    /// fixed bars of 10% (failure) and 0.1% (degraded).
    pub fn calculate_simple_request_status(&self, requests: &RequestHealth) -> (HealthStatus, f64) {
        let ratio = requests.error_ratio();
        if ratio < 0.0 {
            return (HealthStatus::Unknown, -1.0);
        }

        let pct = ratio * 100.0;
        let status = if pct >= SIMPLE_FAILURE_PCT {
            HealthStatus::Failure
        } else if pct >= SIMPLE_DEGRADED_PCT {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        (status, pct)
    }

    pub fn calculate_namespace_app_health(
        &self,
        namespace: &str,
        health: &NamespaceAppHealth,
        annotations: &NamespaceAnnotations,
    ) -> HashMap<String, CalculatedHealth> {
        health
            .iter()
            .map(|(name, app)| {
                let calculated = self.calculate_app_health(namespace, name, Some(app), annotations.get(name));
                (name.clone(), calculated)
            })
            .collect()
    }

    pub fn calculate_namespace_service_health(
        &self,
        namespace: &str,
        health: &NamespaceServiceHealth,
        annotations: &NamespaceAnnotations,
    ) -> HashMap<String, CalculatedHealth> {
        health
            .iter()
            .map(|(name, svc)| {
                let calculated = self.calculate_service_health(namespace, name, Some(svc), annotations.get(name));
                (name.clone(), calculated)
            })
            .collect()
    }

    pub fn calculate_namespace_workload_health(
        &self,
        namespace: &str,
        health: &NamespaceWorkloadHealth,
        annotations: &NamespaceAnnotations,
    ) -> HashMap<String, CalculatedHealth> {
        health
            .iter()
            .map(|(name, wk)| {
                let calculated = self.calculate_workload_health(namespace, name, Some(wk), annotations.get(name));
                (name.clone(), calculated)
            })
            .collect()
    }

    /// Tolerances for one side of an edge: annotation-or-policy tolerances
    /// whose direction pattern matches `direction`.
    pub fn tolerances_for_direction(
        &self,
        namespace: &str,
        name: &str,
        kind: &str,
        direction: &str,
        annotations: Option<&HashMap<String, String>>,
    ) -> Vec<CompiledTolerance> {
        self.matcher
            .tolerances_for_entity(namespace, name, kind, direction, annotations)
    }
}

/// Sum `codes` into `(errors, total)`, where errors are the codes matched by
/// the tolerance's code pattern.
pub fn aggregate_matching_codes(codes: &HashMap<String, f64>, tolerance: &CompiledTolerance) -> (f64, f64) {
    codes.iter().fold((0.0, 0.0), |(errors, total), (code, count)| {
        if tolerance.matches_code(code) {
            (errors + count, total + count)
        } else {
            (errors, total + count)
        }
    })
}

/// Grade an error percentage.
///
/// A zero `degraded` threshold means any error at all is at least Degraded,
/// and a zero `failure` threshold disables the Failure grade.
pub fn apply_thresholds(ratio: f64, degraded: f64, failure: f64) -> HealthStatus {
    if ratio <= 0.0 {
        return HealthStatus::Healthy;
    }
    if failure > 0.0 && ratio >= failure {
        return HealthStatus::Failure;
    }
    if ratio >= degraded {
        return HealthStatus::Degraded;
    }
    HealthStatus::Healthy
}

fn finalize(status: HealthStatus, error_ratio: f64) -> CalculatedHealth {
    match status {
        HealthStatus::Unknown => CalculatedHealth::unknown(),
        _ => CalculatedHealth::new(status, error_ratio.max(0.0)),
    }
}
