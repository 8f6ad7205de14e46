//! Logging setup for the command line tool
//!
//! All log output goes to stderr; stdout is reserved for the JSON report.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit one JSON object per log line
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        if !LEVELS.contains(&self.level.to_lowercase().as_str()) {
            bail!(
                "Invalid log level '{}', expected one of: {}",
                self.level,
                LEVELS.join(", ")
            );
        }
        Ok(())
    }

    /// Directive used when `RUST_LOG` is not set
    fn directive(&self) -> String {
        let level = self.level.to_lowercase();
        format!("tree_diff={level},tree_diff_cli={level}")
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `config`.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.directive()));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
