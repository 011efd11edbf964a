//! Runtime configuration
//!
//! Settings are layered: built-in defaults, then an optional `config.json`
//! in the platform config directory (`~/.config/mensa-menu/` on Linux), then
//! environment variables, then command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::eat_api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::data::{EatApiClient, MenuError};
use crate::refresh::RefreshConfig;

/// Environment variable overriding the canteen key
pub const ENV_LOCATION: &str = "MENSA_LOCATION";

/// Environment variable overriding the eat-api base URL
pub const ENV_API_URL: &str = "MENSA_API_URL";

/// Canteen used when nothing else is configured
pub const DEFAULT_LOCATION: &str = "mensa-garching";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid JSON for `Config`
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Settings for fetching and refreshing the menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// eat-api canteen key
    pub location: String,
    /// eat-api base URL
    pub base_url: String,
    /// Seconds between background refreshes in the terminal widget
    pub refresh_interval_secs: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Refuse plain HTTP URLs and redirects
    pub https_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_interval_secs: 900,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            https_only: true,
        }
    }
}

impl Config {
    /// Path of the default config file, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "mensa-menu")?;
        Some(project_dirs.config_dir().join("config.json"))
    }

    /// Loads the config file at `path`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads defaults overlaid with a config file
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and silently skipped when the file is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Applies `MENSA_LOCATION` and `MENSA_API_URL` from the process environment
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(location) = lookup(ENV_LOCATION).filter(|v| !v.is_empty()) {
            self.location = location;
        }
        if let Some(base_url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        self
    }

    /// Builds the HTTP client described by this config
    pub fn client(&self) -> Result<EatApiClient, MenuError> {
        EatApiClient::with_options(
            self.base_url.clone(),
            Duration::from_secs(self.request_timeout_secs),
            self.https_only,
        )
    }

    /// Refresh loop settings; an interval of zero disables it
    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            interval: Duration::from_secs(self.refresh_interval_secs.max(1)),
            enabled: self.refresh_interval_secs > 0,
        }
    }
}
