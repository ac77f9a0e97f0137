//! Connection and polling configuration.
//!
//! Loaded from `config.json` under the storage root. A missing or malformed
//! file yields defaults; the client must start against a local backend with
//! zero setup.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::error::{Result, ShogunError};
use crate::storage::StorageConfig;

pub const BASE_URL_ENV: &str = "SHOGUN_GUI_URL";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub base_url: String,
    pub dashboard_interval_ms: u64,
    pub shogun_interval_ms: u64,
    pub karo_interval_ms: u64,
    /// Start the dashboard poll loop on launch.
    pub auto_refresh: bool,
    /// Start the shogun pane poll loop on launch.
    pub shogun_auto_refresh: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            dashboard_interval_ms: 5000,
            shogun_interval_ms: 5000,
            karo_interval_ms: 3000,
            auto_refresh: true,
            shogun_auto_refresh: true,
        }
    }
}

impl DashboardConfig {
    pub fn dashboard_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard_interval_ms.max(1))
    }

    pub fn shogun_interval(&self) -> Duration {
        Duration::from_millis(self.shogun_interval_ms.max(1))
    }

    pub fn karo_interval(&self) -> Duration {
        Duration::from_millis(self.karo_interval_ms.max(1))
    }

    /// Replaces the base URL when `base_url` is present and non-blank.
    pub fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.base_url = url.trim().trim_end_matches('/').to_string();
        }
        self
    }

    /// Applies `SHOGUN_GUI_URL` if set.
    pub fn with_env_overrides(self) -> Self {
        self.with_base_url_override(std::env::var(BASE_URL_ENV).ok())
    }
}

/// Loads the configuration, returning defaults if the file doesn't exist or can't be parsed.
pub fn load_config_with_storage(storage: &StorageConfig) -> DashboardConfig {
    let path = storage.config_file();
    let content = match fs_err::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return DashboardConfig::default(),
    };
    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Malformed config; using defaults");
            DashboardConfig::default()
        }
    }
}

/// Saves the configuration to disk.
pub fn save_config_with_storage(storage: &StorageConfig, config: &DashboardConfig) -> Result<()> {
    storage.ensure_dirs()?;
    let path = storage.config_file();
    let content = serde_json::to_string_pretty(config).map_err(|source| ShogunError::Json {
        context: "serializing config".to_string(),
        source,
    })?;
    fs_err::write(&path, content).map_err(|source| ShogunError::ConfigWriteFailed { path, source })
}
