//! Configuration management for registrar.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{StorePaths, DEFAULT_COUNTER_FILE, DEFAULT_DATA_FILE};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "registrar";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `REGISTRAR_`, sections split on `__`)
/// 2. TOML config file at `~/.config/registrar/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the data and counter files.
    /// Defaults to `~/.local/share/registrar`
    pub data_dir: Option<PathBuf>,
    /// Name of the delimited data file.
    pub data_file: String,
    /// Name of the file holding the last assigned identifier.
    pub counter_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None, // Will be resolved to default at runtime
            data_file: DEFAULT_DATA_FILE.to_string(),
            counter_file: DEFAULT_COUNTER_FILE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("REGISTRAR_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let storage = &self.storage;

        for (key, name) in [
            ("data_file", &storage.data_file),
            ("counter_file", &storage.counter_file),
        ] {
            if name.trim().is_empty() {
                return Err(Error::config_validation(format!(
                    "{key} must not be empty"
                )));
            }
            if name.contains(['/', '\\']) {
                return Err(Error::config_validation(format!(
                    "{key} must be a file name, not a path: {name}"
                )));
            }
        }

        if storage.data_file == storage.counter_file {
            return Err(Error::config_validation(format!(
                "data_file and counter_file must differ (both are {})",
                storage.data_file
            )));
        }

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Resolve the files backing the store.
    #[must_use]
    pub fn store_paths(&self) -> StorePaths {
        let dir = self.data_dir();
        StorePaths::new(
            dir.join(&self.storage.data_file),
            dir.join(&self.storage.counter_file),
        )
    }
}
