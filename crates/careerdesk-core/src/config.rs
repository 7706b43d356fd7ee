use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use thiserror::Error;

use crate::ai::gemini::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_IMAGE_MODEL};
use crate::ai::GeminiClient;

/// Environment variables checked for the credential, in order.
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_KEY environment variable not set (also checked GEMINI_API_KEY and the config file)")]
    MissingApiKey,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub chat_model: Option<String>,
    pub image_model: Option<String>,
    pub base_url: Option<String>,
    pub images_dir: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("careerdesk").join("config.json"))
    }

    /// Credential from the environment first, then the config file.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(*name))
            .chain(self.api_key.clone())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn chat_model(&self) -> &str {
        self.chat_model.as_deref().unwrap_or(DEFAULT_CHAT_MODEL)
    }

    pub fn image_model(&self) -> &str {
        self.image_model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Where generated images are written; `<data dir>/careerdesk/images` by default.
    pub fn images_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.images_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(data_dir.join("careerdesk").join("images"))
    }

    /// Build the provider client. Fails when no credential is configured.
    pub fn gemini_client(&self) -> Result<GeminiClient, ConfigError> {
        let api_key = self.resolve_api_key()?;
        Ok(GeminiClient::new(&api_key)
            .with_base_url(self.base_url())
            .with_chat_model(self.chat_model())
            .with_image_model(self.image_model()))
    }
}
