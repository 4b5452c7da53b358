//! secrets::key_file
//!
//! The persisted symmetric key.
//!
//! # Security
//!
//! - The key is 32 raw bytes from the OS RNG
//! - Written atomically with 0600 permissions on Unix (best-effort)
//! - Created lazily on the first encryption, never rotated
//! - Key bytes are never logged; `Debug` is redacted

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{KeyInit, OsRng};
use aes_gcm::Aes256Gcm;

use super::SecretError;
use crate::core::fs::write_atomic;

/// Length of the key in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// A loaded symmetric key.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let generated = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(generated.as_slice());
        Self(bytes)
    }

    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::InvalidKey` if `bytes` is not exactly
    /// [`KEY_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SecretError> {
        let array: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            SecretError::InvalidKey(format!(
                "expected {} bytes, found {}",
                KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Location of the key on disk.
#[derive(Debug, Clone)]
pub struct KeyFile {
    path: PathBuf,
}

impl KeyFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the key if it exists.
    pub fn load(&self) -> Result<Option<SecretKey>, SecretError> {
        match fs::read(&self.path) {
            Ok(bytes) => SecretKey::from_bytes(&bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SecretError::KeyRead(e.to_string())),
        }
    }

    /// Load the key, generating and persisting one if absent.
    pub fn load_or_create(&self) -> Result<SecretKey, SecretError> {
        if let Some(key) = self.load()? {
            return Ok(key);
        }

        let key = SecretKey::generate();
        write_atomic(&self.path, key.as_bytes())
            .map_err(|e| SecretError::KeyWrite(e.to_string()))?;

        tracing::info!(path = %self.path.display(), "created new encryption key");
        Ok(key)
    }
}
