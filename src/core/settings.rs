use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

const APP_DIR_NAME: &str = "HornetModManager";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameTitle {
    HollowKnight,
    Silksong,
}

/// The on-disk settings document. The install core only ever reads the
/// game path out of this; all writes go through explicit GUI commands.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    #[serde(rename = "hollowknightpath")]
    pub hollow_knight_path: String,
    #[serde(rename = "silksongpath")]
    pub silksong_path: String,
}

impl Settings {
    pub fn game_path(&self, game: GameTitle) -> Option<PathBuf> {
        let raw = match game {
            GameTitle::HollowKnight => &self.hollow_knight_path,
            GameTitle::Silksong => &self.silksong_path,
        };
        if raw.is_empty() {
            None
        } else {
            Some(PathBuf::from(raw))
        }
    }

    pub fn set_game_path(&mut self, game: GameTitle, path: String) {
        match game {
            GameTitle::HollowKnight => self.hollow_knight_path = path,
            GameTitle::Silksong => self.silksong_path = path,
        }
    }

    /// Load settings, replacing a missing or corrupt file with defaults.
    /// Unknown keys are dropped and missing keys filled in on the next
    /// save, so an old or hand-edited file cannot wedge startup.
    pub fn load_or_init(path: &Path) -> Settings {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!("Settings file corrupted ({err}), restoring defaults");
                    let defaults = Settings::default();
                    if let Err(save_err) = defaults.save(path) {
                        warn!("Cannot rewrite settings at {path:?}: {save_err}");
                    }
                    defaults
                }
            },
            Err(_) => {
                let defaults = Settings::default();
                if let Err(save_err) = defaults.save(path) {
                    warn!("Cannot create settings at {path:?}: {save_err}");
                }
                defaults
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(SETTINGS_FILE)
}
