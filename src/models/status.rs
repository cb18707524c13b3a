//! Graded health verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health verdict for an app, service or workload.
///
/// Ordered by severity through [`HealthStatus::priority`]. `Unknown` is the
/// absence value: no data, or nothing evaluated yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    #[default]
    #[serde(rename = "NA")]
    Unknown,
    Healthy,
    /// Scaled to zero replicas on purpose
    #[serde(rename = "Not Ready")]
    NotReady,
    Degraded,
    Failure,
}

impl HealthStatus {
    /// Every state, in priority order. Used for state-set metric export.
    pub const ALL: [HealthStatus; 5] = [
        HealthStatus::Unknown,
        HealthStatus::Healthy,
        HealthStatus::NotReady,
        HealthStatus::Degraded,
        HealthStatus::Failure,
    ];

    /// Severity rank; higher is worse.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            HealthStatus::Unknown => 0,
            HealthStatus::Healthy => 1,
            HealthStatus::NotReady => 2,
            HealthStatus::Degraded => 3,
            HealthStatus::Failure => 4,
        }
    }

    /// The more severe of the two; `self` wins a tie.
    #[must_use]
    pub const fn merge(self, other: HealthStatus) -> HealthStatus {
        if other.priority() > self.priority() {
            other
        } else {
            self
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Unknown => "NA",
            HealthStatus::Healthy => "Healthy",
            HealthStatus::NotReady => "Not Ready",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Failure => "Failure",
        }
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, HealthStatus::Unknown)
    }
}

/// Free-function form of [`HealthStatus::merge`].
#[must_use]
pub const fn merge_health_status(s1: HealthStatus, s2: HealthStatus) -> HealthStatus {
    s1.merge(s2)
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialOrd for HealthStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HealthStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority().cmp(&other.priority())
    }
}
