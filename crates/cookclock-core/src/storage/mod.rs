mod config;

pub use config::{
    AlarmConfig, Config, EngineConfig, CUSTOM_CATEGORY, DONE_COLOR, SCHEDULED_CATEGORY,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the CookClock configuration directory, creating it if needed.
///
/// `COOKCLOCK_HOME` overrides the location outright. Otherwise the directory
/// is `~/.config/cookclock[-dev]/`, with the `-dev` suffix when
/// `COOKCLOCK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("COOKCLOCK_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join(".config");
            let env = std::env::var("COOKCLOCK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cookclock-dev")
            } else {
                base_dir.join("cookclock")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
