use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
}

impl Config {
    /// Load the config file, writing out a default one on first run so the
    /// user has something to edit.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let raw = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let raw = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, raw)?;
        Ok(())
    }

    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Token precedence: environment variable, then config file.
    pub fn resolved_api_token(&self) -> Option<String> {
        std::env::var("CODEQUILL_API_TOKEN")
            .ok()
            .or_else(|| self.api_token.clone())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("could not determine config directory"))?;

        Ok(config_dir.join("codequill").join("config.json"))
    }
}
