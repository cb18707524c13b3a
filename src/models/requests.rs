//! Raw request counters as delivered by the metrics collaborator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// protocol -> response code -> request count (or rate)
pub type ProtocolCodes = HashMap<String, HashMap<String, f64>>;

/// Request counters for one entity, split by traffic direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestHealth {
    #[serde(default)]
    pub inbound: ProtocolCodes,
    #[serde(default)]
    pub outbound: ProtocolCodes,
    /// Resource annotations carried alongside the counters, used for
    /// per-entity tolerance overrides.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub health_annotations: HashMap<String, String>,
}

impl RequestHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` requests answered with `code` in the given direction.
    pub fn record(&mut self, direction: &str, protocol: &str, code: &str, count: f64) -> &mut Self {
        let bucket = match direction {
            "outbound" => &mut self.outbound,
            _ => &mut self.inbound,
        };
        *bucket
            .entry(protocol.to_string())
            .or_default()
            .entry(code.to_string())
            .or_insert(0.0) += count;
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.health_annotations.insert(key.into(), value.into());
        self
    }

    /// Counters for a direction name; anything but `outbound` reads inbound.
    pub fn direction(&self, direction: &str) -> &ProtocolCodes {
        match direction {
            "outbound" => &self.outbound,
            _ => &self.inbound,
        }
    }

    /// Combined error fraction over both directions and every protocol.
    ///
    /// A code counts as an error when its first character is `4` or `5`.
    /// Returns a value in `[0, 1]`, or `-1.0` when there was no traffic.
    pub fn error_ratio(&self) -> f64 {
        let mut errors = 0.0;
        let mut total = 0.0;
        for codes in self.inbound.values().chain(self.outbound.values()) {
            for (code, count) in codes {
                total += count;
                if code.starts_with('4') || code.starts_with('5') {
                    errors += count;
                }
            }
        }
        if total == 0.0 {
            return -1.0;
        }
        errors / total
    }

    /// Sum of every counter in both directions.
    pub fn total_request_rate(&self) -> f64 {
        self.inbound
            .values()
            .chain(self.outbound.values())
            .flat_map(|codes| codes.values())
            .sum()
    }

    pub fn has_traffic(&self) -> bool {
        self.total_request_rate() > 0.0
    }
}
