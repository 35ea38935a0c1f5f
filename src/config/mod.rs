use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{FormVaultError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Marker display configuration
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Vault directory (overrides the platform data directory)
    pub data_dir: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// How long scan highlights stay on the page, in milliseconds
    #[serde(default = "default_highlight_ms")]
    pub highlight_ms: u64,

    /// How long fill markers stay on the page, in milliseconds
    #[serde(default = "default_filled_ms")]
    pub filled_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            highlight_ms: default_highlight_ms(),
            filled_ms: default_filled_ms(),
        }
    }
}

fn default_highlight_ms() -> u64 {
    3000
}

fn default_filled_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from all sources (file, env, defaults)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let config: Config = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Merge config file if exists
            .merge(Toml::file(&config_path))
            // Merge environment variables (FORMVAULT_*)
            .merge(Env::prefixed("FORMVAULT_").split("_"))
            .extract()
            .map_err(|e| FormVaultError::ConfigError(e.to_string()))?;

        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("formvault")
            .join("config.toml")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| FormVaultError::ConfigError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the vault directory: explicit override first, then the
    /// platform data directory.
    pub fn vault_dir(&self) -> PathBuf {
        match &self.storage.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("formvault"),
        }
    }
}
