// src/config.rs
use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use toml;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            endpoint: "http://localhost:8000/detect_emotions".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: Option<PathBuf>, // None means the platform data directory
    #[serde(default = "default_clipboard")]
    pub clipboard: bool,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

fn default_clipboard() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: None,
            clipboard: true,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Config {
    /// Where entries and the theme are stored. An explicit override wins over the
    /// config file, which wins over the platform default.
    pub fn resolve_data_dir(&self, override_dir: Option<&Path>) -> Option<PathBuf> {
        if let Some(dir) = override_dir {
            return Some(dir.to_path_buf());
        }
        if let Some(dir) = &self.data_dir {
            return Some(dir.clone());
        }
        project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "MoodJournal", "MoodJournal")
}

fn get_config_path() -> Option<PathBuf> {
    project_dirs().map(|proj_dirs| proj_dirs.config_dir().join("mood_journal_config.toml"))
}

fn save_default_config(config_path: &Path, config: &Config) -> Result<(), String> {
    info!("Attempting to save default config to {:?}", config_path);
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)
                .map_err(|e| format!("Failed to create config directory {:?}: {}", parent_dir, e))?;
            info!("Created config directory: {:?}", parent_dir);
        }
    }

    let toml_string = toml::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize default config to TOML: {}", e))?;

    let mut file = fs::File::create(config_path)
        .map_err(|e| format!("Failed to create default config file {:?}: {}", config_path, e))?;

    file.write_all(toml_string.as_bytes())
        .map_err(|e| format!("Failed to write default config to {:?}: {}", config_path, e))?;

    info!("Saved default configuration to {:?}", config_path);
    Ok(())
}

/// Reads `config_path`, writing a default file there first if there is none.
/// Unreadable or malformed files fall back to defaults.
fn load_config_from(config_path: &Path) -> Config {
    if !config_path.exists() {
        info!(
            "Config file not found at {:?}. Creating and using default configuration.",
            config_path
        );
        let default_config = Config::default();
        if let Err(e) = save_default_config(config_path, &default_config) {
            warn!("Failed to save default configuration: {}", e);
        }
        return default_config;
    }

    info!("Loading configuration from {:?}", config_path);
    match fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(loaded_config) => {
                info!("Configuration loaded successfully.");
                loaded_config
            }
            Err(e) => {
                warn!(
                    "Failed to parse config file at {:?}: {}. Using default configuration.",
                    config_path, e
                );
                Config::default()
            }
        },
        Err(e) => {
            warn!(
                "Failed to read config file at {:?}: {}. Using default configuration.",
                config_path, e
            );
            Config::default()
        }
    }
}

pub fn load_config() -> Config {
    match get_config_path() {
        Some(config_path) => load_config_from(&config_path),
        None => {
            warn!("Could not determine config directory. Using default configuration.");
            Config::default()
        }
    }
}
