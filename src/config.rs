use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::{DEFAULT_MODEL, GEMINI_API_URL, WORLD_GEOJSON_URL};
use crate::error::ConfigError;

const CONFIG_DIR: &str = "maritime-watch";
const CONFIG_FILE: &str = "config.toml";
const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub geometry_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: GEMINI_API_URL.to_string(),
            geometry_url: WORLD_GEOJSON_URL.to_string(),
        }
    }
}

impl Config {
    /// Loads `~/.config/maritime-watch/config.toml` if it exists, then lets
    /// the environment supply the API key.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.apply_env_key(env_api_key(|name| std::env::var(name).ok()));

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply_env_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// First non-blank key among `GEMINI_API_KEY` and `API_KEY`.
fn env_api_key(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_VARS
        .iter()
        .find_map(|name| lookup(*name).filter(|value| !value.trim().is_empty()))
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}
