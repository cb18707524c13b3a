//! Configuration Error Types
//!
//! Errors raised while reading and deserialising the health configuration.
//! Problems inside individual policies (bad regex, inverted thresholds) are
//! not represented here: those are recovered with a warning at compile time.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Configuration file not found at the requested location
    #[error("Configuration file not found: {path}")]
    ConfigFileNotFound { path: PathBuf },

    /// The layered sources could not be merged or deserialised
    #[error("Failed to parse configuration: {error}")]
    ParseError { error: String },
}

impl From<::config::ConfigError> for ConfigurationError {
    fn from(error: ::config::ConfigError) -> Self {
        Self::ParseError {
            error: error.to_string(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;
