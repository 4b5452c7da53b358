//! secrets::cipher
//!
//! Authenticated encryption of provider tokens.
//!
//! # Format
//!
//! `base64(nonce ‖ ciphertext ‖ tag)` with AES-256-GCM and a random 96-bit
//! nonce per message. The tag makes a wrong key or a corrupted value fail
//! loudly instead of decrypting to garbage.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::key_file::SecretKey;
use super::SecretError;

/// GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Encrypts and decrypts strings with one key.
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl TokenCipher {
    pub fn new(key: &SecretKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.as_bytes().into()),
        }
    }

    /// Encrypt `plaintext` into a printable string.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, SecretError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| SecretError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }

    /// Decrypt a string produced by [`TokenCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// `SecretError::Decrypt` if the value is not valid base64, is too short,
    /// was sealed with another key, or does not decode to UTF-8.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, SecretError> {
        let raw = STANDARD
            .decode(ciphertext.trim())
            .map_err(|_| SecretError::Decrypt("ciphertext is not valid base64".into()))?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(SecretError::Decrypt("ciphertext is truncated".into()));
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| SecretError::Decrypt("key does not match ciphertext".into()))?;

        String::from_utf8(plain)
            .map_err(|_| SecretError::Decrypt("plaintext is not valid UTF-8".into()))
    }
}
