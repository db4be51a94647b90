use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MAX_TITLE_LENGTH: usize = 500;
pub const DEFAULT_HASH_RETRY_LIMIT: u32 = 16;
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
    #[serde(default = "default_hash_retry_limit")]
    pub hash_retry_limit: u32,
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,
    #[serde(default = "default_columns")]
    pub default_columns: Vec<String>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_max_title_length() -> usize {
    DEFAULT_MAX_TITLE_LENGTH
}

fn default_hash_retry_limit() -> u32 {
    DEFAULT_HASH_RETRY_LIMIT
}

fn default_save_debounce_ms() -> u64 {
    DEFAULT_SAVE_DEBOUNCE_MS
}

fn default_columns() -> Vec<String> {
    vec![
        "To Do".to_string(),
        "In Progress".to_string(),
        "Done".to_string(),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
            hash_retry_limit: DEFAULT_HASH_RETRY_LIMIT,
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            default_columns: default_columns(),
            data_dir: None,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/taskboard/config.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("taskboard/config.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("taskboard\\config.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    pub fn load() -> Self {
        if let Some(config_path) = Self::config_path() {
            if config_path.exists() {
                if let Ok(content) = std::fs::read_to_string(&config_path) {
                    if let Ok(config) = Self::from_toml(&content) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Directory holding board files, falling back to the platform data dir.
    pub fn effective_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("taskboard")))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
