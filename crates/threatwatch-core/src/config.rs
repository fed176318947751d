//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the auth mode, the auth service URL, where credentials are kept and the
//! last used username.
//!
//! Configuration is stored at `~/.config/threatwatch/config.json`.
//! `THREATWATCH_AUTH_MODE` and `THREATWATCH_API_URL` override the file; they
//! are read once, in [`Config::apply_env`], and nowhere else.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{FileStorage, KeyringStorage, MemoryStorage, Storage};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "threatwatch";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default base URL for the auth service
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

pub const ENV_AUTH_MODE: &str = "THREATWATCH_AUTH_MODE";
pub const ENV_API_URL: &str = "THREATWATCH_API_URL";

/// How logins are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum AuthMode {
    /// Development shortcut: sessions are fabricated locally.
    Bypass,
    /// Credentials are exchanged with the auth service.
    #[default]
    Remote,
}

impl FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bypass" | "development" | "dev" => Ok(AuthMode::Bypass),
            "remote" | "production" | "prod" => Ok(AuthMode::Remote),
            other => Err(anyhow::anyhow!("Unknown auth mode: {}", other)),
        }
    }
}

/// Where the credential store keeps its data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth_mode: AuthMode,
    pub api_base_url: Option<String>,
    pub storage: StorageBackend,
    pub verify_on_startup: bool,
    pub last_username: Option<String>,
}

impl Config {
    /// Load the config file (defaults if missing) and apply env overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `THREATWATCH_*` overrides. Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        if let Ok(mode) = std::env::var(ENV_AUTH_MODE) {
            match mode.parse() {
                Ok(mode) => self.auth_mode = mode,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_AUTH_MODE),
            }
        }
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api_base_url = Some(url.trim().to_string());
            }
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for stored credentials and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Build the storage backend the credential store should use.
    pub fn open_storage(&self) -> Result<Arc<dyn Storage>> {
        Ok(match self.storage {
            StorageBackend::File => Arc::new(FileStorage::new(self.data_dir()?.join("session"))),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new()),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        })
    }
}
