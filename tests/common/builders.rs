use mesh_health::config::{HealthConfig, MeshHealthConfig, Rate, Tolerance};
use mesh_health::models::{AppHealth, RequestHealth, ServiceHealth, WorkloadHealth, WorkloadStatus};

/// Request counters from `(direction, protocol, code, count)` tuples
pub fn requests(entries: &[(&str, &str, &str, f64)]) -> RequestHealth {
    let mut requests = RequestHealth::new();
    for (direction, protocol, code, count) in entries {
        requests.record(direction, protocol, code, *count);
    }
    requests
}

/// Inbound HTTP counters from `(code, count)` pairs
pub fn inbound_http(codes: &[(&str, f64)]) -> RequestHealth {
    let mut requests = RequestHealth::new();
    for (code, count) in codes {
        requests.record("inbound", "http", code, *count);
    }
    requests
}

pub fn service(requests: RequestHealth) -> ServiceHealth {
    ServiceHealth {
        requests,
        status: None,
    }
}

pub fn workload(status: Option<WorkloadStatus>, requests: RequestHealth) -> WorkloadHealth {
    WorkloadHealth {
        workload_status: status,
        requests,
        status: None,
    }
}

pub fn app(workloads: Vec<WorkloadStatus>, requests: RequestHealth) -> AppHealth {
    AppHealth {
        workload_statuses: workloads,
        requests,
        status: None,
    }
}

/// Catch-all rate with the given tolerances
pub fn catch_all(tolerances: Vec<Tolerance>) -> Rate {
    Rate {
        tolerance: tolerances,
        ..Rate::default()
    }
}

/// Health config with the given rates followed by the built-in default
pub fn health_config(rates: Vec<Rate>) -> HealthConfig {
    let mut config = HealthConfig {
        rate: rates,
        ..HealthConfig::default()
    };
    config.add_health_default();
    config
}

/// Full configuration with scheduler timing and metrics switch
pub fn mesh_config(rates: Vec<Rate>, refresh_interval: &str, timeout: &str, duration: &str) -> MeshHealthConfig {
    let mut config = MeshHealthConfig::default();
    config.health = health_config(rates);
    config.health.compute.refresh_interval = refresh_interval.to_string();
    config.health.compute.timeout = timeout.to_string();
    config.health.compute.duration = duration.to_string();
    config
}
