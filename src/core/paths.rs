//! core::paths
//!
//! Centralized path routing for gitpr storage locations.
//!
//! # Storage Layout
//!
//! All persisted state lives in one directory:
//! - `config.json` - Provider configs and the notification webhook
//! - `.key` - Symmetric key used to encrypt tokens at rest
//!
//! # Location
//!
//! Resolved in order:
//! 1. `$GITPR_CONFIG_DIR` if set
//! 2. `<platform config dir>/gitpr` (e.g. `~/.config/gitpr` on Linux)
//!
//! # Example
//!
//! ```
//! use gitpr::core::paths::AppPaths;
//! use std::path::PathBuf;
//!
//! let paths = AppPaths::new(PathBuf::from("/home/me/.config/gitpr"));
//! assert_eq!(paths.config_file(), PathBuf::from("/home/me/.config/gitpr/config.json"));
//! assert_eq!(paths.key_file(), PathBuf::from("/home/me/.config/gitpr/.key"));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable overriding the storage directory.
pub const CONFIG_DIR_ENV: &str = "GITPR_CONFIG_DIR";

/// Directory name under the platform config dir.
const APP_DIR_NAME: &str = "gitpr";

#[derive(Debug, Error)]
pub enum PathError {
    #[error("cannot determine the platform config directory; set {CONFIG_DIR_ENV}")]
    NoConfigDir,
}

/// Storage locations for one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    dir: PathBuf,
}

impl AppPaths {
    /// Use an explicit storage directory.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Resolve the storage directory from the environment.
    pub fn resolve() -> Result<Self, PathError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            if !dir.is_empty() {
                return Ok(Self::new(PathBuf::from(dir)));
            }
        }

        let base = dirs::config_dir().ok_or(PathError::NoConfigDir)?;
        Ok(Self::new(base.join(APP_DIR_NAME)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the persisted config record.
    pub fn config_file(&self) -> PathBuf {
        self.dir.join("config.json")
    }

    /// Path of the symmetric key file.
    pub fn key_file(&self) -> PathBuf {
        self.dir.join(".key")
    }
}
