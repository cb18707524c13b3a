use proptest::prelude::*;

use mesh_health::config::Tolerance;
use mesh_health::models::HealthStatus;

/// Any health status
pub fn status_strategy() -> impl Strategy<Value = HealthStatus> {
    prop::sample::select(HealthStatus::ALL.to_vec())
}

/// Non-negative percentage with two decimals
pub fn percentage_strategy() -> impl Strategy<Value = f64> {
    (0u32..=10_000).prop_map(|v| f64::from(v) / 100.0)
}

/// Threshold pair with `degraded <= failure`
pub fn threshold_pair_strategy() -> impl Strategy<Value = (f64, f64)> {
    (percentage_strategy(), percentage_strategy()).prop_map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
}

/// Response code patterns as authors write them
pub fn code_pattern_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("5XX".to_string()),
        Just("4xx".to_string()),
        Just("503".to_string()),
        Just("^-$".to_string()),
        "[1-5][0-9X]{2}",
    ]
}

/// One annotation entry that may or may not be well formed
pub fn annotation_entry_strategy() -> impl Strategy<Value = (String, bool)> {
    prop_oneof![
        (code_pattern_strategy(), threshold_pair_strategy(), prop::sample::select(vec!["http", "grpc"]))
            .prop_map(|(code, (d, f), protocol)| (format!("{code},{d},{f},{protocol},inbound"), true)),
        "[a-z]{1,12}".prop_map(|garbage| (garbage, false)),
        (code_pattern_strategy(), 1u32..100)
            .prop_map(|(code, d)| (format!("{code},{},{d},http,inbound", d + 1), false)),
        code_pattern_strategy().prop_map(|code| (format!("{code},abc,10,http,inbound"), false)),
    ]
}

/// Tolerance with valid thresholds
pub fn tolerance_strategy() -> impl Strategy<Value = Tolerance> {
    (code_pattern_strategy(), threshold_pair_strategy())
        .prop_map(|(code, (degraded, failure))| Tolerance::new(code, degraded, failure, "http", ".*"))
}
