//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Engine timing (grace period, tick interval)
//! - Alarm rendering preferences
//! - The predefined task menu
//! - Category display colors
//!
//! Configuration is stored at `~/.config/cookclock/config.toml`.
//! Tasks themselves are never written to disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::preset::{self, Preset};
use crate::timer::{KitchenConfig, DEFAULT_GRACE_PERIOD_SECS};

/// Category of tasks typed in by hand.
pub const CUSTOM_CATEGORY: &str = "Custom";
/// Category of hand-typed tasks with a future start.
pub const SCHEDULED_CATEGORY: &str = "Scheduled";
/// Color of every finished task regardless of category.
pub const DONE_COLOR: &str = "#28a745";

/// Engine timing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Alarm configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Ring the terminal bell on completion.
    #[serde(default = "default_true")]
    pub bell: bool,
    /// Shell command run on completion, e.g. `aplay ~/alarm.wav` (optional).
    /// The task name is passed in `COOKCLOCK_TASK`.
    #[serde(default)]
    pub command: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/cookclock/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    /// Category name to CSS-style hex color.
    #[serde(default = "default_colors")]
    pub colors: BTreeMap<String, String>,
    #[serde(default = "preset::default_presets")]
    pub presets: Vec<Preset>,
}

// Default functions
fn default_grace_period_secs() -> u64 {
    DEFAULT_GRACE_PERIOD_SECS
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_colors() -> BTreeMap<String, String> {
    [
        ("Kebab Frying", "#e67e22"),
        ("Rice Cooking", "#3498db"),
        ("Test 1", "#f1c40f"),
        ("Water Motor", "#1abc9c"),
        (CUSTOM_CATEGORY, "#9b59b6"),
        (SCHEDULED_CATEGORY, "#f39c12"),
        ("Upcoming", "#d35400"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period_secs(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            bell: true,
            command: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            alarm: AlarmConfig::default(),
            colors: default_colors(),
            presets: preset::default_presets(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional strings are null until first set.
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be created.
    pub fn path() -> std::result::Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.engine.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.tick_interval_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        if let Some(blank) = self.presets.iter().position(|p| p.name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: format!("presets[{blank}].name"),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Engine settings in the form the kitchen engine takes.
    pub fn kitchen(&self) -> KitchenConfig {
        KitchenConfig {
            grace_period_secs: self.engine.grace_period_secs,
        }
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.engine.tick_interval_ms.max(1))
    }

    /// # Errors
    ///
    /// Returns `CoreError::UnknownPreset` if no preset has this name.
    pub fn preset(&self, name: &str) -> Result<&Preset> {
        preset::find(&self.presets, name).ok_or_else(|| CoreError::UnknownPreset(name.to_string()))
    }

    /// Display color for a category, falling back to the custom color.
    pub fn color_for(&self, category: &str) -> &str {
        self.colors
            .get(category)
            .or_else(|| self.colors.get(CUSTOM_CATEGORY))
            .map(String::as_str)
            .unwrap_or("#9b59b6")
    }
}
