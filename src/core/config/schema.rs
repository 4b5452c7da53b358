//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Layout
//!
//! One JSON object. Top-level keys are provider names, each mapping to a
//! [`ProviderConfig`]; the optional notification webhook sits alongside them:
//!
//! ```json
//! {
//!   "github": { "encrypted_token": "…", "base_url": "https://api.github.com" },
//!   "gitlab": { "encrypted_token": "…", "base_url": "https://gitlab.com" },
//!   "notification_webhook": "https://hooks.slack.com/services/…"
//! }
//! ```
//!
//! # Validation
//!
//! Provider keys must name a known forge and `base_url` must be an http(s)
//! URL. Unknown top-level keys that are not provider objects are rejected at
//! parse time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::forge::ForgeProvider;

/// Stored settings for one provider.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Token encrypted with the local key (see [`crate::secrets`]).
    #[serde(alias = "token")]
    pub encrypted_token: String,

    /// API root for GitHub, instance root for GitLab.
    pub base_url: String,
}

// Ciphertext is not secret on its own, but keep it out of logs anyway.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("encrypted_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    fn validate(&self, provider: &str) -> Result<(), ConfigError> {
        if self.encrypted_token.is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "{}: encrypted_token is empty",
                provider
            )));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue(format!(
                "{}: base_url '{}' must start with http:// or https://",
                provider, self.base_url
            )));
        }
        Ok(())
    }
}

/// The whole persisted config record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForgeConfig {
    /// Global outbound notification webhook.
    #[serde(
        default,
        alias = "slack_webhook",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_webhook: Option<String>,

    /// Provider settings keyed by provider name.
    #[serde(flatten)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl ForgeConfig {
    /// Settings for `provider`, if logged in.
    pub fn provider(&self, provider: ForgeProvider) -> Option<&ProviderConfig> {
        self.providers.get(provider.name())
    }

    /// Insert or replace one provider, leaving the others untouched.
    pub fn set_provider(&mut self, provider: ForgeProvider, config: ProviderConfig) {
        self.providers.insert(provider.name().to_string(), config);
    }

    /// Providers with stored credentials.
    pub fn configured_providers(&self) -> Vec<ForgeProvider> {
        self.providers
            .keys()
            .filter_map(|k| ForgeProvider::parse(k))
            .collect()
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, provider) in &self.providers {
            if ForgeProvider::parse(name).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "unknown provider '{}', must be one of: {}",
                    name,
                    ForgeProvider::names().join(", ")
                )));
            }
            provider.validate(name)?;
        }

        if let Some(webhook) = &self.notification_webhook {
            if !webhook.starts_with("https://") && !webhook.starts_with("http://") {
                return Err(ConfigError::InvalidValue(format!(
                    "notification_webhook '{}' must be an http(s) URL",
                    webhook
                )));
            }
        }

        Ok(())
    }
}
