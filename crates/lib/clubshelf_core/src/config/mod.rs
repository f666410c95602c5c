// @awa-component: CFG-ClubConfig
//
//! Runtime configuration.
//!
//! Values come from an optional YAML file and are then overridden by
//! environment variables:
//!
//! | Variable              | Meaning                     | Default                           |
//! |-----------------------|-----------------------------|-----------------------------------|
//! | `CLUBSHELF_ADMIN_IDS` | comma-separated admin ids   | none                              |
//! | `CLUBSHELF_STATE`     | path of the JSON state file | `<data dir>/clubshelf/state.json` |
//! | `CLUBSHELF_LOG`       | log specification           | `info`                            |
//!
//! Gated routes and loyalty thresholds are deliberately not configurable.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_ADMIN_IDS: &str = "CLUBSHELF_ADMIN_IDS";
pub const ENV_STATE: &str = "CLUBSHELF_STATE";
pub const ENV_LOG: &str = "CLUBSHELF_LOG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid administrator id '{0}'")]
    InvalidAdminId(String),
}

/// Clubshelf configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClubConfig {
    /// Identities allowed to run administrative commands.
    pub admin_ids: Vec<i64>,
    pub state_path: PathBuf,
    pub log_spec: String,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            admin_ids: Vec::new(),
            state_path: default_state_path(),
            log_spec: "info".to_string(),
        }
    }
}

impl ClubConfig {
    /// Load from `path` (if given), then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a YAML config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply overrides from a variable lookup (the environment in production).
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(ENV_ADMIN_IDS) {
            self.admin_ids = parse_admin_ids(&raw)?;
        }
        if let Some(path) = lookup(ENV_STATE).filter(|p| !p.trim().is_empty()) {
            self.state_path = PathBuf::from(path);
        }
        if let Some(spec) = lookup(ENV_LOG).filter(|s| !s.trim().is_empty()) {
            self.log_spec = spec;
        }
        Ok(self)
    }
}

/// Parse `"1, 2,3"` into ids. Empty entries are skipped.
pub fn parse_admin_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| ConfigError::InvalidAdminId(part.to_string()))
        })
        .collect()
}

/// Default location of the state file.
pub fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clubshelf")
        .join("state.json")
}
