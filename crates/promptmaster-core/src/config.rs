use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::ai::gemini::DEFAULT_BASE_URL;
use crate::model::{ModelSelection, ModelTier};

/// Environment variables checked, in order, before the stored key
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub pro_model: Option<String>,
    pub lite_model: Option<String>,
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
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {:?}: {}", path, e))?;
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

    pub fn save_api_key(key: &str) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.api_key = Some(key.to_string());
        config.save()
    }

    /// API key from the environment, falling back to the config file
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    fn api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.trim().is_empty()))
    }

    /// Where the resolved key came from, for display
    pub fn api_key_source(&self) -> Option<&'static str> {
        self.api_key_source_with(|name| std::env::var(name).ok())
    }

    fn api_key_source_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<&'static str> {
        API_KEY_VARS
            .iter()
            .find(|name| lookup(name).is_some_and(|v| !v.trim().is_empty()))
            .copied()
            .or_else(|| {
                self.api_key
                    .as_deref()
                    .filter(|key| !key.trim().is_empty())
                    .map(|_| "config file")
            })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn models(&self) -> ModelSelection {
        ModelSelection {
            pro: self
                .pro_model
                .clone()
                .unwrap_or_else(|| ModelTier::Pro.default_model().to_string()),
            lite: self
                .lite_model
                .clone()
                .unwrap_or_else(|| ModelTier::FlashLite.default_model().to_string()),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("promptmaster").join("config.json"))
    }
}
