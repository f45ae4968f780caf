//! Configuration handling for Cascade
//!
//! Configuration is stored in `config.toml` under the platform config
//! directory (`~/.config/cascade/config.toml` on Linux). Every key is
//! optional.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{SortKey, DEFAULT_PRIORITY, MAX_PRIORITY, MIN_PRIORITY};

/// Environment variable overriding the database location
pub const DB_ENV: &str = "CASCADE_DB";

/// File name of the database inside the data directory
const DB_FILE: &str = "cascade.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database location (overridden by `--db` and `CASCADE_DB`)
    pub database: Option<PathBuf>,

    /// Priority for `task add` when `--priority` is omitted
    pub default_priority: u8,

    /// Sort key for `task list` when `--sort` is omitted
    pub default_sort: SortKey,

    /// Output format when `--format` is omitted
    pub default_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            default_priority: DEFAULT_PRIORITY,
            default_sort: SortKey::default(),
            default_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from a specific file, falling back to defaults
    /// when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Parses and validates a TOML document
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.default_priority) {
            return Err(ConfigError::Invalid(format!(
                "default_priority must be between {} and {}, got {}",
                MIN_PRIORITY, MAX_PRIORITY, self.default_priority
            )));
        }
        Ok(())
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "cascade", "cascade")
    }

    /// Returns the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Returns the default database path inside the platform data directory
    pub fn default_database_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().join(DB_FILE))
    }

    /// Resolves the database path: explicit flag or `CASCADE_DB` first,
    /// then the config file, then the platform data directory
    pub fn database_path(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        if let Some(path) = &self.database {
            return Ok(path.clone());
        }

        Self::default_database_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory; pass --db or set {}", DB_ENV))
    }
}
