//! User configuration
//!
//! Non-secret settings persisted as TOML. Missing fields fall back to
//! defaults; the bot token lives only in memory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::write_atomic;
use crate::paths;
use crate::presence::PresenceDocument;

/// Persisted settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application (client) id the presence session connects with
    pub application_id: String,
    /// Display name for the bot profile
    pub display_name: String,
    /// Bot token. Never serialized.
    #[serde(skip)]
    pub bot_token: Option<String>,
    pub presence: PresenceDocument,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("config file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Loads and saves [`Config`] at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at ~/.lumen/config.toml
    pub fn default_location() -> Self {
        Self::new(paths::config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config, returning defaults when the file does not exist
    pub fn load(&self) -> Result<Config, ConfigError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No config file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Atomically replace the config file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        write_atomic(&self.path, contents.as_bytes())?;
        debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}
