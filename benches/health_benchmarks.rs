use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;

use mesh_health::config::{HealthConfig, Rate, Tolerance};
use mesh_health::health::{HealthCalculator, HealthRateMatcher};
use mesh_health::models::{NamespaceServiceHealth, RequestHealth, ServiceHealth};

fn policies() -> HealthConfig {
    let mut rate: Vec<Rate> = (0..20)
        .map(|i| Rate {
            namespace: format!("team-{i}"),
            kind: "service|workload".to_string(),
            name: format!("api-.*-{i}"),
            tolerance: vec![Tolerance::new("5XX", 1.0, 5.0, "http", "inbound")],
        })
        .collect();
    rate.push(Rate {
        namespace: "bookinfo".to_string(),
        tolerance: vec![Tolerance::new("5XX", 10.0, 20.0, "http", ".*")],
        ..Rate::default()
    });

    let mut config = HealthConfig {
        rate,
        ..HealthConfig::default()
    };
    config.add_health_default();
    config
}

fn namespace_services(count: usize) -> NamespaceServiceHealth {
    (0..count)
        .map(|i| {
            let mut requests = RequestHealth::new();
            requests
                .record("inbound", "http", "200", 1000.0)
                .record("inbound", "http", "503", (i % 50) as f64)
                .record("outbound", "grpc", "0", 200.0)
                .record("outbound", "grpc", "14", (i % 7) as f64);
            (format!("svc-{i}"), ServiceHealth { requests, status: None })
        })
        .collect()
}

fn benchmark_matching_rate(c: &mut Criterion) {
    let matcher = HealthRateMatcher::new(&policies().rate);

    c.bench_function("matching_rate_specific", |b| {
        b.iter(|| matcher.matching_rate(black_box("team-19"), black_box("api-orders-19"), black_box("service")))
    });
    c.bench_function("matching_rate_default", |b| {
        b.iter(|| matcher.matching_rate(black_box("default"), black_box("ratings"), black_box("app")))
    });
}

fn benchmark_namespace_services(c: &mut Criterion) {
    let calculator = HealthCalculator::from_config(&policies());
    let services = namespace_services(200);
    let annotations = HashMap::new();

    c.bench_function("namespace_service_health_200", |b| {
        b.iter(|| calculator.calculate_namespace_service_health(black_box("bookinfo"), &services, &annotations))
    });
}

criterion_group!(benches, benchmark_matching_rate, benchmark_namespace_services);
criterion_main!(benches);
