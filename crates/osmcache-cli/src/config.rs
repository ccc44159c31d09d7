//! Harness configuration management.
//!
//! This module handles loading and saving the harness configuration: the
//! application credentials issued by OSM, the authorised user's session,
//! and optional connection and cache overrides.
//!
//! Configuration is stored at `~/.config/osmcache/settings.json`.
//! `OSM_API_ID`, `OSM_TOKEN` and `OSM_BASE_URL` override the file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use osmcache_core::{CacheSettings, ConnectionConfig, SessionData};

/// Application name used for the config directory path
const APP_NAME: &str = "osmcache";

/// Config file name
const CONFIG_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub api_id: String,
    #[serde(default)]
    pub token: String,
    pub user_id: Option<String>,
    pub secret: Option<String>,
    pub base_url: Option<String>,
    pub cache_minutes: Option<i64>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
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

    /// Apply environment overrides, looked up through `var`.
    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let set = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        if let Some(api_id) = set("OSM_API_ID") {
            self.api_id = api_id;
        }
        if let Some(token) = set("OSM_TOKEN") {
            self.token = token;
        }
        if let Some(base_url) = set("OSM_BASE_URL") {
            self.base_url = Some(base_url);
        }
        self
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_id.is_empty() && !self.token.is_empty()
    }

    /// The saved user session, if it is complete.
    pub fn session(&self) -> Option<SessionData> {
        match (&self.user_id, &self.secret) {
            (Some(user_id), Some(secret)) => {
                Some(SessionData::new(user_id.as_str(), secret.as_str()))
                    .filter(SessionData::is_valid)
            }
            _ => None,
        }
    }

    pub fn remember_session(&mut self, data: &SessionData) {
        self.user_id = Some(data.user_id.clone());
        self.secret = Some(data.secret.clone());
    }

    pub fn forget_session(&mut self) {
        self.user_id = None;
        self.secret = None;
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::default();
        if let Some(ref base_url) = self.base_url {
            config.base_url = base_url.clone();
        }
        config
    }

    pub fn cache_settings(&self) -> CacheSettings {
        self.cache_minutes
            .map(|minutes| CacheSettings::from_minutes(minutes.max(0)))
            .unwrap_or_default()
    }
}
