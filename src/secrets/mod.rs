//! secrets
//!
//! Encryption of provider tokens at rest.
//!
//! # Architecture
//!
//! - [`KeyFile`]: the persisted 32-byte key (`<config dir>/.key`)
//! - [`TokenCipher`]: AES-256-GCM over one key
//! - [`SecretStore`]: the two combined; loads the key lazily
//!
//! # Security
//!
//! - Tokens and key bytes are **never** logged or included in error messages
//! - The key file uses 0600 permissions on Unix (best-effort)
//! - All writes are atomic (temp file + rename)
//! - One key per installation, never rotated automatically
//!
//! # Example
//!
//! ```no_run
//! use gitpr::core::paths::AppPaths;
//! use gitpr::secrets::SecretStore;
//!
//! let store = SecretStore::from_paths(&AppPaths::resolve().unwrap());
//! let sealed = store.encrypt("ghp_xxxx").unwrap();
//! assert_eq!(store.decrypt(&sealed).unwrap(), "ghp_xxxx");
//! ```

mod cipher;
mod key_file;

pub use cipher::TokenCipher;
pub use key_file::{KeyFile, SecretKey, KEY_LEN};

use std::path::PathBuf;

use thiserror::Error;

use crate::core::paths::AppPaths;

/// Errors from secret operations.
///
/// Note: Error messages intentionally do not include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read the key file.
    #[error("failed to read key file: {0}")]
    KeyRead(String),

    /// Failed to persist a new key file.
    #[error("failed to write key file: {0}")]
    KeyWrite(String),

    /// The key file exists but does not hold a usable key.
    #[error("invalid key file: {0}")]
    InvalidKey(String),

    /// Encryption failed.
    #[error("failed to encrypt token")]
    Encrypt,

    /// The ciphertext could not be decrypted with the local key.
    #[error("failed to decrypt token: {0}")]
    Decrypt(String),
}

/// Encrypts and decrypts tokens with the installation key.
#[derive(Debug, Clone)]
pub struct SecretStore {
    key_file: KeyFile,
}

impl SecretStore {
    pub fn new(key_path: PathBuf) -> Self {
        Self {
            key_file: KeyFile::new(key_path),
        }
    }

    pub fn from_paths(paths: &AppPaths) -> Self {
        Self::new(paths.key_file())
    }

    pub fn key_file(&self) -> &KeyFile {
        &self.key_file
    }

    /// Encrypt a token, creating the key on first use.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, SecretError> {
        let key = self.key_file.load_or_create()?;
        TokenCipher::new(&key).encrypt(plaintext)
    }

    /// Decrypt a stored token.
    ///
    /// A missing key file is a decryption failure: nothing can have been
    /// encrypted without it.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, SecretError> {
        let key = self
            .key_file
            .load()?
            .ok_or_else(|| SecretError::Decrypt("no encryption key on this machine".into()))?;
        TokenCipher::new(&key).decrypt(ciphertext)
    }
}
