use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tree_diff::DiffOptions;

use crate::telemetry::LoggingConfig;

/// Settings read from `config.toml`; command-line flags override them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDiffConfig {
    #[serde(default)]
    pub compare: DiffOptions,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Indent the JSON report
    #[serde(default)]
    pub pretty: bool,
    /// Sort `added_files` and `deleted_files`
    #[serde(default)]
    pub sorted: bool,
}

impl TreeDiffConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: TreeDiffConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Load `explicit` if given, else the per-user config file if one exists,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.logging.validate()
    }
}

/// `$XDG_CONFIG_HOME/tree-diff/config.toml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tree-diff").join("config.toml"))
}
