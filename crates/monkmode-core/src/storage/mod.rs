mod config;
pub mod database;

pub use config::{Config, SoundConfig};
pub use database::{Database, SessionRecord, Stats};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/monkmode[-dev]/` based on MONKMODE_ENV.
///
/// Set MONKMODE_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("MONKMODE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("monkmode-dev")
    } else {
        base_dir.join("monkmode")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
