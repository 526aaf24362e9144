//! `packman.toml` configuration
//!
//! Looked up in the project root unless `--config` names a file. A missing
//! file yields the defaults. Environment variables `PACKMAN_REGISTRY_URL`
//! and `PACKMAN_CONCURRENCY` override file values; CLI flags override both.

use crate::error::ConfigError;
use crate::registry::{AlternativeEntry, AlternativesCatalog, NPM_REGISTRY_URL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration file name
pub const CONFIG_FILE: &str = "packman.toml";

/// Default number of concurrent registry requests
pub const DEFAULT_CONCURRENCY: usize = 8;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Pretty,
    /// JSON lines
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("invalid log format '{}': expected 'pretty' or 'json'", other)),
        }
    }
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Contents of `packman.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// npm-compatible registry base URL
    pub registry_url: String,
    /// Maximum concurrent registry requests
    pub concurrency: usize,
    /// Registry request timeout in seconds
    pub timeout_secs: u64,
    /// Package manager override (npm, yarn, pnpm, bun)
    pub package_manager: Option<String>,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Replacement suggestions keyed by the package they replace
    pub alternatives: BTreeMap<String, Vec<AlternativeEntry>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_url: NPM_REGISTRY_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            package_manager: None,
            logging: LoggingConfig::default(),
            alternatives: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load `explicit` if given (it must exist), else `packman.toml` in
    /// `project_dir` if present, else the defaults
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = project_dir.join(CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if config.concurrency == 0 {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                message: "concurrency must be at least 1".to_string(),
            });
        }
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PACKMAN_REGISTRY_URL") {
            self.registry_url = val;
        }
        if let Ok(val) = std::env::var("PACKMAN_CONCURRENCY") {
            match val.parse::<usize>() {
                Ok(v) if v > 0 => self.concurrency = v,
                _ => tracing::warn!(value = %val, "ignoring invalid PACKMAN_CONCURRENCY"),
            }
        }
    }

    /// Registry request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Catalog built from the `[alternatives]` tables
    pub fn alternatives_catalog(&self) -> AlternativesCatalog {
        AlternativesCatalog::from_entries(self.alternatives.clone())
    }
}
