//! Centralized path utilities
//!
//! All application paths in one place for consistency

use std::path::PathBuf;

use crate::constants::fs;

/// Get the lumen home directory (~/.lumen, or $LUMEN_HOME when set)
pub fn home_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(fs::HOME_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(fs::HOME_DIR_NAME)
}

/// Get the config file (~/.lumen/config.toml)
pub fn config_path() -> PathBuf {
    home_dir().join(fs::CONFIG_FILE_NAME)
}

/// Get the asset catalog document (~/.lumen/assets.json)
pub fn catalog_path() -> PathBuf {
    home_dir().join(fs::CATALOG_FILE_NAME)
}

/// Get the managed asset directory (~/.lumen/assets)
pub fn assets_dir() -> PathBuf {
    home_dir().join(fs::ASSETS_DIR_NAME)
}

/// Get the logs directory (~/.lumen/logs)
pub fn logs_dir() -> PathBuf {
    home_dir().join(fs::LOGS_DIR_NAME)
}
