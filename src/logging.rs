//! # Structured Logging Module
//!
//! Environment-aware console logging for the health pipeline. Logs go to
//! stdout: human-readable (ANSI colours when attached to a terminal) in
//! development and test, one JSON object per line in production.
//!
//! ## Configuration
//!
//! - `MESH_HEALTH_ENV` (or `APP_ENV`): `development` (default), `test`, `production`
//! - `LOG_LEVEL` or `RUST_LOG`: explicit filter, e.g. `mesh_health=debug,info`

use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// Safe to call repeatedly; an already-installed global subscriber (from a
/// host application or a test harness) is kept.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let json = environment == "production";
        let use_ansi = !json && IsTerminal::is_terminal(&std::io::stdout());

        let json_layer = json.then(|| {
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_filter(EnvFilter::new(&log_level))
        });
        let console_layer = (!json).then(|| {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(use_ansi)
                .with_filter(EnvFilter::new(&log_level))
        });

        let subscriber = tracing_subscriber::registry().with(json_layer).with(console_layer);

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        } else {
            tracing::info!(
                environment = %environment,
                log_level = %log_level,
                json = json,
                ansi_colors = use_ansi,
                "Structured logging initialized"
            );
        }
    });
}

/// Current environment from environment variables
fn get_environment() -> String {
    std::env::var("MESH_HEALTH_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Log filter: explicit `LOG_LEVEL`/`RUST_LOG`, else an environment default
fn get_log_level(environment: &str) -> String {
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        return level.to_lowercase();
    }
    if let Ok(level) = std::env::var("RUST_LOG") {
        return level.to_lowercase();
    }
    default_log_level(environment).to_string()
}

fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(default_log_level("test"), "debug");
        assert_eq!(default_log_level("development"), "debug");
        assert_eq!(default_log_level("production"), "info");
        assert_eq!(default_log_level("staging"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
    }
}
