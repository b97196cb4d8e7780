//! Application-level configuration loading, including optional extra themes.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::catalog::{Theme, ThemeAccess, ThemeCategory, ordinary_theme};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GUESSO_CONFIG_PATH";

const DEFAULT_MAX_PLAYERS: usize = 8;
const DEFAULT_ROOM_CODE_ATTEMPTS: u32 = 5;
const DEFAULT_COMMIT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    max_players: usize,
    room_code_attempts: u32,
    commit_attempts: u32,
    premium_unlocked: bool,
    extra_themes: Vec<Theme>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        max_players = app_config.max_players,
                        extra_themes = app_config.extra_themes.len(),
                        "loaded config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document. Missing keys take their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Room capacity.
    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Attempts at drawing an unused room code.
    pub fn room_code_attempts(&self) -> u32 {
        self.room_code_attempts
    }

    /// Optimistic re-read attempts per room write.
    pub fn commit_attempts(&self) -> u32 {
        self.commit_attempts
    }

    /// Whether every room is treated as premium-entitled.
    pub fn premium_unlocked(&self) -> bool {
        self.premium_unlocked
    }

    /// Themes added on top of the built-in catalog.
    pub fn extra_themes(&self) -> &[Theme] {
        &self.extra_themes
    }

    /// Override the premium switch.
    pub fn with_premium_unlocked(mut self, unlocked: bool) -> Self {
        self.premium_unlocked = unlocked;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            room_code_attempts: DEFAULT_ROOM_CODE_ATTEMPTS,
            commit_attempts: DEFAULT_COMMIT_ATTEMPTS,
            premium_unlocked: false,
            extra_themes: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    max_players: Option<usize>,
    room_code_attempts: Option<u32>,
    commit_attempts: Option<u32>,
    #[serde(default)]
    premium_unlocked: bool,
    #[serde(default)]
    extra_themes: Vec<RawTheme>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let extra_themes = value
            .extra_themes
            .into_iter()
            .filter_map(|raw| match raw.into_theme() {
                Ok(theme) => Some(theme),
                Err(reason) => {
                    warn!(%reason, "skipping invalid extra theme");
                    None
                }
            })
            .collect();

        Self {
            max_players: value
                .max_players
                .filter(|max| *max >= 2)
                .unwrap_or(DEFAULT_MAX_PLAYERS),
            room_code_attempts: value
                .room_code_attempts
                .filter(|attempts| *attempts > 0)
                .unwrap_or(DEFAULT_ROOM_CODE_ATTEMPTS),
            commit_attempts: value
                .commit_attempts
                .filter(|attempts| *attempts > 0)
                .unwrap_or(DEFAULT_COMMIT_ATTEMPTS),
            premium_unlocked: value.premium_unlocked,
            extra_themes,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of an extra ordinary theme.
struct RawTheme {
    id: String,
    title: String,
    #[serde(default)]
    emoji: String,
    #[serde(default)]
    verified_only: bool,
    items: Vec<RawThemeItem>,
}

#[derive(Debug, Deserialize)]
struct RawThemeItem {
    id: String,
    label: String,
    #[serde(default)]
    emoji: String,
}

impl RawTheme {
    fn into_theme(self) -> Result<Theme, String> {
        let access = if self.verified_only {
            ThemeAccess::Verified
        } else {
            ThemeAccess::Free
        };
        let items: Vec<(&str, &str, &str)> = self
            .items
            .iter()
            .map(|item| (item.id.as_str(), item.emoji.as_str(), item.label.as_str()))
            .collect();
        ordinary_theme(
            &self.id,
            &self.title,
            &self.emoji,
            ThemeCategory::Custom,
            access,
            &items,
        )
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
