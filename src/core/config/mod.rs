//! core::config
//!
//! Persisted provider configuration.
//!
//! # Overview
//!
//! `login` writes one [`ProviderConfig`] per provider into a single JSON
//! record; every other command reads it. Writing one provider merges into
//! the existing record instead of replacing it, so a GitHub login does not
//! erase a stored GitLab login.
//!
//! # Example
//!
//! ```no_run
//! use gitpr::core::config::{ConfigFile, ProviderConfig};
//! use gitpr::core::paths::AppPaths;
//! use gitpr::forge::ForgeProvider;
//!
//! let paths = AppPaths::resolve().unwrap();
//! let file = ConfigFile::from_paths(&paths);
//!
//! file.update(|config| {
//!     config.set_provider(
//!         ForgeProvider::GitHub,
//!         ProviderConfig {
//!             encrypted_token: "…".into(),
//!             base_url: "https://api.github.com".into(),
//!         },
//!     );
//! })
//! .unwrap();
//! ```

pub mod schema;

pub use schema::{ForgeConfig, ProviderConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::fs::write_atomic;
use crate::core::paths::AppPaths;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Handle on the config record on disk.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn from_paths(paths: &AppPaths) -> Self {
        Self::new(paths.config_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record.
    ///
    /// Returns `Ok(None)` when nobody has logged in yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load(&self) -> Result<Option<ForgeConfig>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| ConfigError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;

        let config: ForgeConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(Some(config))
    }

    /// Load the record, or an empty one if the file does not exist.
    pub fn load_or_default(&self) -> Result<ForgeConfig, ConfigError> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Write the record atomically with owner-only permissions.
    pub fn save(&self, config: &ForgeConfig) -> Result<(), ConfigError> {
        config.validate()?;

        let contents = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        write_atomic(&self.path, contents.as_bytes()).map_err(|e| ConfigError::WriteError {
            path: self.path.clone(),
            source: e,
        })?;

        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    /// Read-modify-write: apply `edit` to the current record and save it.
    ///
    /// Returns the record as written.
    pub fn update<F>(&self, edit: F) -> Result<ForgeConfig, ConfigError>
    where
        F: FnOnce(&mut ForgeConfig),
    {
        let mut config = self.load_or_default()?;
        edit(&mut config);
        self.save(&config)?;
        Ok(config)
    }
}
