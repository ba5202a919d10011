//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the equal-time.toml file.
//! It covers the isochrone provider connection and the default search parameters,
//! including the minute cap every search is bounded by.
//!
//! ```toml
//! [provider]
//! api_key = "..."
//! isochrone_url = "https://routing.api.2gis.com/isochrone/2.0.0"
//! http_timeout_sec = 30
//! retry_total = 3
//! retry_backoff_sec = 1.0
//! pool_size = 10
//! max_durations_per_call = 5
//!
//! [search]
//! start_minutes = 20
//! step_minutes = 10
//! tolerance_minutes = 10
//! max_minutes_cap = 40
//! ```

use crate::search::SearchConfig;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "equal-time.toml";

/// Environment variable that overrides `provider.api_key`.
pub const API_KEY_ENV: &str = "DGIS_API_KEY";

/// Errors from strict config loading and saving.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration loaded from equal-time.toml
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Isochrone provider connection
    pub provider: ProviderConfig,
    /// Default search parameters and the minute cap
    pub search: SearchConfig,
}

/// Isochrone provider connection settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// 2GIS API key; `DGIS_API_KEY` takes precedence when set
    pub api_key: String,
    /// Isochrone endpoint
    pub isochrone_url: String,
    /// Per-call timeout in seconds
    pub http_timeout_sec: u64,
    /// Retries for 502/503/504 and transport failures
    pub retry_total: u32,
    /// Base backoff in seconds, doubled on each retry
    pub retry_backoff_sec: f64,
    /// Idle connections kept per host
    pub pool_size: usize,
    /// Provider limit on durations per request
    pub max_durations_per_call: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            api_key: String::new(),
            isochrone_url: "https://routing.api.2gis.com/isochrone/2.0.0".to_string(),
            http_timeout_sec: 30,
            retry_total: 3,
            retry_backoff_sec: 1.0,
            pool_size: 10,
            max_durations_per_call: 5,
        }
    }
}

impl Config {
    /// Load configuration from equal-time.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let config = match Self::try_load_from_path(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(ConfigError::Io(_)) => {
                info!(
                    "No config file at {}, using default configuration",
                    path.display()
                );
                Self::default()
            }
            Err(e) => {
                warn!("{e}; using default configuration");
                Self::default()
            }
        };
        config.with_env_overrides()
    }

    /// Load configuration from specified path, failing on a missing or invalid file
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str::<Config>(&contents)?)
    }

    /// Apply `DGIS_API_KEY` if it is set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.provider.api_key = key;
            }
        }
        self
    }

    /// Save current configuration as pretty TOML
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
