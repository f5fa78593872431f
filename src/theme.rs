// src/theme.rs
use crate::error::{StoreError, StoreResult};
use crate::store::KeyValueStore;
use log;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const THEME_KEY: &str = "theme";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// `System` has no terminal-independent answer, so it renders like dark.
    pub fn is_light(self) -> bool {
        self == Theme::Light
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{}' (expected system, light or dark)", other)),
        }
    }
}

/// Unknown, malformed or missing values read as `System`.
pub fn load_theme<S: KeyValueStore>(kv: &S) -> Theme {
    match kv.get(THEME_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<Theme>(&raw) {
            Ok(theme) => theme,
            // Plain, unquoted values are accepted too.
            Err(_) => raw.parse::<Theme>().unwrap_or_else(|e| {
                log::warn!("Ignoring stored theme {:?}: {}", raw, e);
                Theme::default()
            }),
        },
        Ok(None) => Theme::default(),
        Err(e) => {
            log::warn!("Could not read theme preference: {}", e);
            Theme::default()
        }
    }
}

pub fn save_theme<S: KeyValueStore>(kv: &S, theme: Theme) -> StoreResult<()> {
    let raw = serde_json::to_string(&theme).map_err(|e| StoreError::Serialization(e.to_string()))?;
    kv.set(THEME_KEY, &raw)?;
    log::info!("Theme set to {}", theme);
    Ok(())
}
