//! Application configuration management.
//!
//! Configuration is read once at startup: a JSON file under
//! `~/.config/fixboard/config.json`, with environment variables taking
//! precedence. A `.env` file is honored via dotenvy, loaded in `main`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/state directory paths
const APP_NAME: &str = "fixboard";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default API origin for a local development backend
const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Environment variable overriding the API base URL
const ENV_API_URL: &str = "FIXBOARD_API_URL";

/// Environment variable overriding the admin contact email
const ENV_ADMIN_EMAIL: &str = "FIXBOARD_ADMIN_EMAIL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub admin_email: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted credential record
    pub fn state_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// API base origin: environment, then config file, then the default
    pub fn api_base_url(&self) -> String {
        std::env::var(ENV_API_URL)
            .ok()
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Admin contact email: environment, then config file
    pub fn admin_email(&self) -> Option<String> {
        std::env::var(ENV_ADMIN_EMAIL)
            .ok()
            .or_else(|| self.admin_email.clone())
    }
}
