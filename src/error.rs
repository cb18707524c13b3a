//! Error types for the mesh health pipeline.
//!
//! Configuration problems inside the matcher, the annotation parser and the
//! duration helpers are recovered locally and never reach this type. What is
//! left are collaborator failures (counted per cluster or namespace by the
//! monitor) and the few conditions that abort a whole refresh cycle.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigurationError;

#[derive(Debug, Error)]
pub enum MeshHealthError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The per-cycle collaborator layer could not be built. Aborts the cycle.
    #[error("Failed to construct health layer: {0}")]
    LayerConstruction(String),

    #[error("No service account client for cluster {cluster}")]
    MissingClient { cluster: String },

    #[error("Failed to list namespaces for cluster {cluster}: {reason}")]
    Namespaces { cluster: String, reason: String },

    #[error("Failed to fetch {kind} health for {cluster}/{namespace}: {reason}")]
    HealthFetch {
        kind: String,
        cluster: String,
        namespace: String,
        reason: String,
    },

    #[error(
        "All health computations failed for {cluster}/{namespace}: app={app}, service={service}, workload={workload}"
    )]
    AllHealthComputationsFailed {
        cluster: String,
        namespace: String,
        app: String,
        service: String,
        workload: String,
    },

    #[error("Health refresh cancelled")]
    Cancelled,

    #[error("Health refresh timed out after {0:?}")]
    Timeout(Duration),
}

impl MeshHealthError {
    /// Convenience constructor used by raw-health collaborators.
    pub fn health_fetch(
        kind: impl Into<String>,
        cluster: impl Into<String>,
        namespace: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::HealthFetch {
            kind: kind.into(),
            cluster: cluster.into(),
            namespace: namespace.into(),
            reason: reason.into(),
        }
    }

    /// Errors that stop the current cycle instead of being counted.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::LayerConstruction(_) | Self::Cancelled | Self::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MeshHealthError>;
