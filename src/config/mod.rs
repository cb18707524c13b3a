//! # Mesh Health Configuration
//!
//! Configuration for the health pipeline: the ordered rate-policy list used by
//! the tolerance matcher, the scheduler timing of the background monitor, and
//! the observability switches.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mesh_health::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load_from_file("config/mesh-health.toml")?;
//! let compute = manager.config().health.compute.resolve();
//! println!("refreshing every {:?}", compute.refresh_interval);
//! # Ok(())
//! # }
//! ```

pub mod duration;
pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

pub use duration::{format_duration, parse_duration};
pub use error::{ConfigResult, ConfigurationError};
pub use loader::{ConfigManager, ENV_PREFIX};

/// Fallback refresh interval for the background monitor
pub const DEFAULT_REFRESH_INTERVAL: &str = "2m";
/// Fallback upper bound for a single refresh cycle
pub const DEFAULT_TIMEOUT: &str = "10m";
/// Fallback metrics query window
pub const DEFAULT_DURATION: &str = "5m";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MeshHealthConfig {
    /// Health policies and scheduler timing
    pub health: HealthConfig,

    /// Metrics export settings
    pub observability: ObservabilityConfig,
}

/// One error-rate threshold rule.
///
/// `code` is a regular expression over response codes in which every literal
/// `X`/`x` stands for a digit, so `5XX` covers `500` to `599`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Tolerance {
    pub code: String,
    pub degraded: f64,
    pub failure: f64,
    pub protocol: String,
    pub direction: String,
}

impl Tolerance {
    pub fn new(
        code: impl Into<String>,
        degraded: f64,
        failure: f64,
        protocol: impl Into<String>,
        direction: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            degraded,
            failure,
            protocol: protocol.into(),
            direction: direction.into(),
        }
    }

    /// Threshold sanity: both non-negative and `degraded <= failure`.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.degraded >= 0.0 && self.failure >= 0.0) {
            return Err(format!(
                "thresholds must be non-negative (degraded={}, failure={})",
                self.degraded, self.failure
            ));
        }
        if self.degraded > self.failure {
            return Err(format!(
                "degraded threshold {} exceeds failure threshold {}",
                self.degraded, self.failure
            ));
        }
        Ok(())
    }
}

/// An entity matcher bundling tolerances.
///
/// Empty patterns match anything. Position in the list is the priority: the
/// first matching rate wins and the last entry acts as the default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Rate {
    pub namespace: String,
    pub kind: String,
    pub name: String,
    pub tolerance: Vec<Tolerance>,
}

/// Health policies and scheduler timing
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Ordered rate policies, most specific first
    pub rate: Vec<Rate>,

    /// Background computation timing
    pub compute: ComputeConfig,
}

impl HealthConfig {
    /// Append the built-in catch-all policy.
    ///
    /// Called once after loading so the default always sits at the end of the
    /// list, behind any user-supplied rate.
    pub fn add_health_default(&mut self) {
        self.rate.push(Rate {
            tolerance: vec![
                Tolerance::new("5XX", 0.0, 10.0, "http", ".*"),
                Tolerance::new("4XX", 10.0, 20.0, "http", ".*"),
                Tolerance::new("^[1-9]$|^1[0-6]$", 0.0, 10.0, "grpc", ".*"),
                // "-" marks a request that got no response at all
                Tolerance::new("^-$", 0.0, 10.0, "http|grpc", ".*"),
            ],
            ..Rate::default()
        });
    }
}

/// Scheduler timing as written by the operator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ComputeConfig {
    pub refresh_interval: String,
    pub timeout: String,
    pub duration: String,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL.to_string(),
            timeout: DEFAULT_TIMEOUT.to_string(),
            duration: DEFAULT_DURATION.to_string(),
        }
    }
}

/// Scheduler timing after parsing, with defaults substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCompute {
    pub refresh_interval: Duration,
    pub timeout: Duration,
    pub duration: Duration,
    /// The query window exactly as configured (or the default string)
    pub duration_str: String,
}

impl ComputeConfig {
    /// Parse the three duration strings.
    ///
    /// Any value that does not parse, or parses to zero, is replaced by its
    /// default with a warning. This never fails.
    pub fn resolve(&self) -> ResolvedCompute {
        let (refresh_interval, _) =
            resolve_one("refresh_interval", &self.refresh_interval, DEFAULT_REFRESH_INTERVAL);
        let (timeout, _) = resolve_one("timeout", &self.timeout, DEFAULT_TIMEOUT);
        let (duration, duration_str) = resolve_one("duration", &self.duration, DEFAULT_DURATION);

        ResolvedCompute {
            refresh_interval,
            timeout,
            duration,
            duration_str,
        }
    }
}

fn resolve_one(field: &str, value: &str, default: &str) -> (Duration, String) {
    match parse_duration(value) {
        Ok(parsed) if !parsed.is_zero() => (parsed, value.trim().to_string()),
        Ok(_) => {
            warn!(field = field, value = value, default = default, "Zero duration configured, using default");
            (default_duration(default), default.to_string())
        }
        Err(e) => {
            warn!(field = field, value = value, default = default, error = %e, "Invalid duration configured, using default");
            (default_duration(default), default.to_string())
        }
    }
}

fn default_duration(default: &str) -> Duration {
    // Defaults are compile-time constants known to parse
    parse_duration(default).unwrap_or(Duration::from_secs(300))
}

/// Metrics export settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Emit per-item status gauges and refresh-cycle metrics
    pub metrics_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_validation() {
        assert!(Tolerance::new("5XX", 10.0, 20.0, "http", "inbound").validate().is_ok());
        assert!(Tolerance::new("5XX", 0.0, 10.0, "http", ".*").validate().is_ok());
        assert!(Tolerance::new("5XX", 20.0, 10.0, "http", ".*").validate().is_err());
        assert!(Tolerance::new("5XX", -1.0, 10.0, "http", ".*").validate().is_err());
        assert!(Tolerance::new("5XX", f64::NAN, 10.0, "http", ".*").validate().is_err());
    }

    #[test]
    fn test_default_policy_is_appended_last() {
        let mut config = HealthConfig {
            rate: vec![Rate {
                namespace: "production".to_string(),
                ..Rate::default()
            }],
            ..HealthConfig::default()
        };
        config.add_health_default();

        assert_eq!(config.rate.len(), 2);
        assert_eq!(config.rate[0].namespace, "production");
        let default = config.rate.last().unwrap();
        assert!(default.namespace.is_empty() && default.kind.is_empty() && default.name.is_empty());
        assert_eq!(default.tolerance.len(), 4);
        assert!(default.tolerance.iter().all(|t| t.validate().is_ok()));
    }

    #[test]
    fn test_resolve_compute_defaults() {
        let resolved = ComputeConfig::default().resolve();
        assert_eq!(resolved.refresh_interval, Duration::from_secs(120));
        assert_eq!(resolved.timeout, Duration::from_secs(600));
        assert_eq!(resolved.duration, Duration::from_secs(300));
        assert_eq!(resolved.duration_str, "5m");
    }

    #[test]
    fn test_resolve_compute_falls_back_on_garbage() {
        let compute = ComputeConfig {
            refresh_interval: "soon".to_string(),
            timeout: "0".to_string(),
            duration: "90s".to_string(),
        };
        let resolved = compute.resolve();
        assert_eq!(resolved.refresh_interval, Duration::from_secs(120));
        assert_eq!(resolved.timeout, Duration::from_secs(600));
        assert_eq!(resolved.duration, Duration::from_secs(90));
        assert_eq!(resolved.duration_str, "90s");
    }
}
