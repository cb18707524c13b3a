//! Configuration Loader
//!
//! Layers an optional configuration file (TOML, YAML or JSON, picked by
//! extension) under `MESH_HEALTH__*` environment overrides, then appends the
//! built-in default policy.

use ::config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::MeshHealthConfig;

/// Prefix for environment overrides, e.g. `MESH_HEALTH__HEALTH__COMPUTE__TIMEOUT=5m`
pub const ENV_PREFIX: &str = "MESH_HEALTH";

/// Loaded, immutable configuration
#[derive(Debug)]
pub struct ConfigManager {
    config: MeshHealthConfig,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// Load from environment overrides only
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::build(None)
    }

    /// Load from a file, then apply environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Arc<ConfigManager>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigurationError::ConfigFileNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::build(Some(path.to_path_buf()))
    }

    /// Wrap an already-built configuration (tests, embedding callers).
    ///
    /// The default policy is appended here too, so every manager exposes the
    /// same policy-list shape.
    pub fn from_config(mut config: MeshHealthConfig) -> Arc<ConfigManager> {
        config.health.add_health_default();
        Arc::new(ConfigManager {
            config,
            source: None,
        })
    }

    fn build(path: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let mut builder = Config::builder();

        if let Some(path) = &path {
            debug!(path = %path.display(), "Loading health configuration file");
            builder = builder.add_source(File::from(path.as_path()));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

        let mut config: MeshHealthConfig = builder.build()?.try_deserialize()?;
        let user_rates = config.health.rate.len();
        config.health.add_health_default();

        info!(
            source = path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "environment".to_string()),
            user_rates = user_rates,
            refresh_interval = %config.health.compute.refresh_interval,
            timeout = %config.health.compute.timeout,
            duration = %config.health.compute.duration,
            metrics_enabled = config.observability.metrics_enabled,
            "Health configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            source: path,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &MeshHealthConfig {
        &self.config
    }

    /// File the configuration came from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
