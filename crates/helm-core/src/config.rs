use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::persistence::FileStore;
use crate::projector::DEFAULT_QUIET_WINDOW;

/// Server-provided startup configuration. Only the fields the selector reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupConfig {
    #[serde(default, alias = "default_agent_id")]
    pub default_agent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmConfig {
    /// Agent to select when nothing was used before in a slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_agent_id: Option<String>,

    #[serde(default = "default_quiet_window_ms")]
    pub quiet_window_ms: u64,

    /// Catalog files merged in order.
    #[serde(default)]
    pub catalog_paths: Vec<PathBuf>,

    /// Location of the last-used selection store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

fn default_quiet_window_ms() -> u64 {
    DEFAULT_QUIET_WINDOW.as_millis() as u64
}

impl Default for HelmConfig {
    fn default() -> Self {
        Self {
            default_agent_id: None,
            quiet_window_ms: default_quiet_window_ms(),
            catalog_paths: Vec::new(),
            store_path: None,
        }
    }
}

impl HelmConfig {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::Configuration("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("helm").join("config.toml"))
    }

    /// Load config from the default location, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config file at {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.quiet_window_ms)
    }

    pub fn startup_config(&self) -> StartupConfig {
        StartupConfig {
            default_agent_id: self.default_agent_id.clone(),
        }
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => FileStore::default_path(),
        }
    }
}
