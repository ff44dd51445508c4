// ABOUTME: Configuration module for the quickdeck application
// ABOUTME: Loads and saves the flat JSON settings file with safe defaults

use crate::errors::{DeckError, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default location of the settings file, relative to the working directory.
pub const CONFIG_PATH: &str = "config.json";

/// Default directory for generated presentations.
pub const DEFAULT_SAVE_LOCATION: &str = "generated_presentations";

/// Flat key-value settings shared by every front end.
///
/// Loaded once at process start and passed by reference into the components
/// that need it. Writes are rare and interactive; concurrent writers from two
/// processes may race and lose a write, which is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub groq_key: String,
    pub serpapi_key: String,
    pub save_location: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            groq_key: String::new(),
            serpapi_key: String::new(),
            save_location: DEFAULT_SAVE_LOCATION.to_string(),
        }
    }
}

impl Config {
    /// Load the settings file, falling back to (and persisting) the defaults
    /// if the file is missing or fails to parse. Never errors.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("Config file {:?} not found, creating defaults", path);
            let config = Config::default();
            if let Err(e) = config.save(path) {
                warn!("Failed to write default config to {:?}: {}", path, e);
            }
            return config;
        }

        match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Config>(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Config file {:?} is corrupt ({}), resetting", path, e);
                    let config = Config::default();
                    if let Err(e) = config.save(path) {
                        warn!("Failed to reset config at {:?}: {}", path, e);
                    }
                    config
                }
            },
            Err(e) => {
                warn!("Config file {:?} unreadable ({}), using defaults", path, e);
                let config = Config::default();
                if let Err(e) = config.save(path) {
                    warn!("Failed to reset config at {:?}: {}", path, e);
                }
                config
            }
        }
    }

    /// Write the full settings file (pretty-printed JSON).
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DeckError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, json).map_err(DeckError::FileReadError)
    }

    /// Read-modify-write of a single named field.
    pub fn update(path: &Path, key: &str, value: &str) -> Result<Config> {
        let mut config = Config::load(path);
        config.set(key, value)?;
        config.save(path)?;
        Ok(config)
    }

    /// Set one field by its JSON key name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_key" => self.api_key = value.to_string(),
            "groq_key" => self.groq_key = value.to_string(),
            "serpapi_key" => self.serpapi_key = value.to_string(),
            "save_location" => self.save_location = value.to_string(),
            other => {
                return Err(DeckError::ValidationError(format!(
                    "Unknown config key: {}",
                    other
                )));
            }
        }
        Ok(())
    }

    /// Get one field by its JSON key name, if it exists.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "api_key" => Some(&self.api_key),
            "groq_key" => Some(&self.groq_key),
            "serpapi_key" => Some(&self.serpapi_key),
            "save_location" => Some(&self.save_location),
            _ => None,
        }
    }
}
