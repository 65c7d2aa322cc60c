//! Core error types for cookclock-core.
//!
//! Unknown task ids rarely surface as errors: lookups
//! return `Option`, and mutating calls on a missing id are silent no-ops.
//! `CoreError::NotFound` only surfaces from `require`.

use std::path::PathBuf;
use thiserror::Error;

use crate::task::TaskId;

/// Core error type for cookclock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected user input; no task was created.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Task is not (or no longer) in the registry.
    #[error("Task {0} not found")]
    NotFound(TaskId),

    /// No predefined task with this name.
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// No usable configuration directory
    #[error("Cannot determine configuration directory")]
    NoDataDir,
}

/// Validation errors raised by task creation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name was empty or whitespace only
    #[error("task name must not be empty")]
    EmptyName,

    /// Duration below zero seconds
    #[error("duration must not be negative (got {0}s)")]
    NegativeDuration(i64),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_into_invalid_input() {
        let err: CoreError = ValidationError::EmptyName.into();
        assert!(matches!(err, CoreError::InvalidInput(ValidationError::EmptyName)));
        assert_eq!(err.to_string(), "Invalid input: task name must not be empty");
    }

    #[test]
    fn not_found_mentions_id() {
        let err = CoreError::NotFound(TaskId(7));
        assert_eq!(err.to_string(), "Task 7 not found");
    }
}
