use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::session::SessionConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    /// Defaults for the setup step; flags on the command line win
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    /// Unset means requests wait as long as the backend takes
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

pub fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

impl Config {
    /// Location of `config.toml`, if the platform has a config directory
    pub fn path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "agentdeck", "agentdeck")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        if let Some(config_file) = Self::path() {
            if config_file.exists() {
                let content = std::fs::read_to_string(&config_file)?;
                let config: Config = toml::from_str(&content)?;
                tracing::debug!("Loaded config from {}", config_file.display());
                return Ok(config);
            }
        }
        Ok(Config::default())
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_file =
            Self::path().ok_or_else(|| anyhow::anyhow!("No config directory on this platform"))?;
        if let Some(parent) = config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_file, content)?;
        Ok(config_file)
    }
}
