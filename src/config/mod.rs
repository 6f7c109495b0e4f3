//! Configuration system for clusterlens
//!
//! Supports loading configuration from:
//! 1. CLI --config argument (`.json` or `.toml`)
//! 2. ~/.config/clusterlens/config.{CLUSTERLENS_ENV}.json
//! 3. Default values
//!
//! Where CLUSTERLENS_ENV can be: production (default), development, test
//!
//! # Examples
//!
//! ```no_run
//! use clusterlens::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load(None)?;
//! println!("{} labels, top {} keywords", config.labels.len(), config.top_n);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variables
//!
//! Environment variables override config file values:
//! - CLUSTERLENS_DB_PATH
//! - CLUSTERLENS_TOP_N
//! - CLUSTERLENS_CLUSTER_COUNT
//! - CLUSTERLENS_DEBUG

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to parse config TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// The 18 interest categories items are divided into
pub const DEFAULT_LABELS: [&str; 18] = [
    "arts and fashion",
    "books and literature",
    "business finance and entrepreneurs",
    "celebrity and pop culture",
    "crisis (war and disaster)",
    "family and parenting",
    "film tv and video",
    "fitness and health",
    "food and dining",
    "games",
    "law government and politics",
    "learning and educational",
    "music",
    "news and social concern",
    "pets",
    "science and technology",
    "sports",
    "travel and adventure",
];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Expected cluster labels, in output order
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Number of cluster indices ranked by the keyword command
    #[serde(default = "default_cluster_count")]
    pub cluster_count: usize,

    /// Keywords kept per cluster
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// SQLite database path
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Append logs to this file as well as stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()
}

fn default_cluster_count() -> usize {
    DEFAULT_LABELS.len()
}

fn default_top_n() -> usize {
    5
}

fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "clusterlens", "clusterlens")
        .map(|dirs| dirs.data_dir().join("clusterlens.db"))
        .unwrap_or_else(|| PathBuf::from("clusterlens.db"))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            labels: default_labels(),
            cluster_count: default_cluster_count(),
            top_n: default_top_n(),
            database_path: default_database_path(),
            log_file: None,
            debug: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };

        // Apply environment variable overrides
        config.apply_env_overrides()?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration with standard priority:
    /// 1. Explicit path
    /// 2. ~/.config/clusterlens/config.{CLUSTERLENS_ENV}.json
    /// 3. Defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            if path.exists() {
                return Self::from_file(path);
            } else {
                return Err(ConfigError::ValidationError(format!(
                    "Config file not found: {:?}",
                    path
                )));
            }
        }

        let env = std::env::var("CLUSTERLENS_ENV").unwrap_or_else(|_| "production".to_string());

        if let Some(config_dir) = Self::config_dir() {
            let config_path = config_dir.join(format!("config.{}.json", env));

            if config_path.exists() {
                return Self::from_file(&config_path);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides. Unparseable numbers are rejected.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("CLUSTERLENS_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }

        if let Some(raw) = var("CLUSTERLENS_TOP_N") {
            self.top_n = parse_number("CLUSTERLENS_TOP_N", &raw)?;
        }

        if let Some(raw) = var("CLUSTERLENS_CLUSTER_COUNT") {
            self.cluster_count = parse_number("CLUSTERLENS_CLUSTER_COUNT", &raw)?;
        }

        if let Some(debug) = var("CLUSTERLENS_DEBUG") {
            self.debug = debug.eq_ignore_ascii_case("true")
                || debug == "1"
                || debug.eq_ignore_ascii_case("yes");
        }

        Ok(())
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.labels.is_empty() {
            return Err(ConfigError::ValidationError(
                "labels cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.labels.len());
        for label in &self.labels {
            if label.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "labels cannot contain blank entries".to_string(),
                ));
            }
            if !seen.insert(label.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate label: {}",
                    label
                )));
            }
        }

        if self.cluster_count == 0 {
            return Err(ConfigError::ValidationError(
                "cluster_count must be greater than 0".to_string(),
            ));
        }

        if self.top_n == 0 {
            return Err(ConfigError::ValidationError(
                "top_n must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Labels and cluster indices are two namespaces kept aligned by
    /// convention; warn when they obviously disagree.
    pub fn warn_on_namespace_mismatch(&self) {
        if self.labels.len() != self.cluster_count {
            tracing::warn!(
                "{} labels configured but cluster_count is {}",
                self.labels.len(),
                self.cluster_count
            );
        }
    }

    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("clusterlens"))
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn parse_number(name: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!("{}={:?} is not a non-negative integer", name, raw))
    })
}

/// Read a JSON array of labels, e.g. `["music", "pets"]`
pub fn load_labels_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
