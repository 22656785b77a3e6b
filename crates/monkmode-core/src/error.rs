//! Core error types for monkmode-core.
//!
//! Invalid timer transitions (pause while paused, resume while running,
//! anything after the timer finished) are deliberately no-ops rather than
//! errors: the timer is driven by user-interface events that can race a state
//! change, and a rapid double-tap must not surface a failure. Only
//! construction-time validation and the storage/config layers can fail.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for monkmode-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer construction errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Catalog lookup errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Timer construction errors. The only way the timer itself can fail.
#[derive(Error, Debug)]
pub enum TimerError {
    /// The supplied stage sequence was empty
    #[error("stage sequence is empty")]
    EmptyStages,

    /// A stage carries a zero duration
    #[error("stage {index} ('{id}') has zero duration")]
    ZeroDurationStage { index: usize, id: String },
}

/// Catalog lookup errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Unknown preset id
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// A preset references an exercise id that does not exist
    #[error("preset '{preset}' references unknown exercise '{exercise}'")]
    UnknownExercise { preset: String, exercise: String },
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("database migration failed: {0}")]
    MigrationFailed(String),

    /// IO errors (data directory creation and the like)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
