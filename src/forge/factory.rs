//! forge::factory
//!
//! Forge selection and creation.
//!
//! # Design
//!
//! This module is the central location for forge selection logic. Commands
//! call [`connect`] (or [`create_forge`] when they already hold a token)
//! rather than importing specific forge implementations.
//!
//! # Provider Detection
//!
//! The provider is chosen from the remote host:
//! - host contains `gitlab` → GitLab
//! - host contains `github` → GitHub
//! - otherwise the provider whose stored `base_url` has the same host
//!   (self-hosted instances with neutral names)
//! - otherwise GitHub
//!
//! # Example
//!
//! ```ignore
//! use gitpr::forge::connect;
//!
//! let conn = connect(&ctx, &config, &secrets).await?;
//! println!("logged in to {} as {}", conn.provider, conn.user);
//! let cr = conn.forge.get_change_request(42).await?;
//! ```

use super::github::{self, GitHubForge};
use super::gitlab::{self, GitLabForge};
use super::traits::{Forge, ForgeError};
use crate::core::config::ForgeConfig;
use crate::git::RepositoryContext;
use crate::secrets::SecretStore;

/// Supported forge providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ForgeProvider {
    /// GitHub and GitHub Enterprise (pull requests)
    GitHub,
    /// GitLab and self-hosted GitLab (merge requests)
    GitLab,
}

impl ForgeProvider {
    /// Get all providers.
    ///
    /// # Example
    ///
    /// ```
    /// use gitpr::forge::ForgeProvider;
    ///
    /// let providers = ForgeProvider::all();
    /// assert!(providers.contains(&ForgeProvider::GitHub));
    /// assert!(providers.contains(&ForgeProvider::GitLab));
    /// ```
    pub fn all() -> &'static [ForgeProvider] {
        &[ForgeProvider::GitHub, ForgeProvider::GitLab]
    }

    /// Provider names as used for config keys and `--provider`.
    pub fn names() -> &'static [&'static str] {
        &["github", "gitlab"]
    }

    /// Get the provider name as a string.
    ///
    /// This matches the key used in the configuration file.
    pub fn name(&self) -> &'static str {
        match self {
            ForgeProvider::GitHub => "github",
            ForgeProvider::GitLab => "gitlab",
        }
    }

    /// Parse a provider from a string.
    ///
    /// # Example
    ///
    /// ```
    /// use gitpr::forge::ForgeProvider;
    ///
    /// assert_eq!(ForgeProvider::parse("GitLab"), Some(ForgeProvider::GitLab));
    /// assert_eq!(ForgeProvider::parse("unknown"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(ForgeProvider::GitHub),
            "gitlab" => Some(ForgeProvider::GitLab),
            _ => None,
        }
    }

    /// Base URL to store at login.
    ///
    /// Without a host (or with the public host) this is the public service;
    /// otherwise GitHub Enterprise's `https://{host}/api/v3` or the
    /// self-hosted GitLab root `https://{host}`.
    ///
    /// # Example
    ///
    /// ```
    /// use gitpr::forge::ForgeProvider;
    ///
    /// assert_eq!(ForgeProvider::GitHub.base_url(None), "https://api.github.com");
    /// assert_eq!(
    ///     ForgeProvider::GitHub.base_url(Some("github.example.com")),
    ///     "https://github.example.com/api/v3"
    /// );
    /// assert_eq!(
    ///     ForgeProvider::GitLab.base_url(Some("gitlab.example.com")),
    ///     "https://gitlab.example.com"
    /// );
    /// ```
    pub fn base_url(&self, host: Option<&str>) -> String {
        let host = host
            .map(|h| h.trim().trim_end_matches('/'))
            .filter(|h| !h.is_empty());

        match (self, host) {
            (ForgeProvider::GitHub, None) | (ForgeProvider::GitHub, Some("github.com")) => {
                github::DEFAULT_API_BASE.to_string()
            }
            (ForgeProvider::GitHub, Some(host)) => format!("https://{}/api/v3", host),
            (ForgeProvider::GitLab, None) => gitlab::DEFAULT_INSTANCE_URL.to_string(),
            (ForgeProvider::GitLab, Some(host)) => format!("https://{}", host),
        }
    }
}

impl std::fmt::Display for ForgeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the forge provider for a repository.
///
/// `config` is consulted only when the host name does not mention either
/// provider.
///
/// # Example
///
/// ```
/// use gitpr::forge::{detect_provider, ForgeProvider};
/// use gitpr::git::parse_remote_url;
///
/// let ctx = parse_remote_url("git@gitlab.com:acme/widgets.git").unwrap();
/// assert_eq!(detect_provider(&ctx, None), ForgeProvider::GitLab);
/// ```
pub fn detect_provider(ctx: &RepositoryContext, config: Option<&ForgeConfig>) -> ForgeProvider {
    let host = ctx.host.to_lowercase();

    if host.contains("gitlab") {
        return ForgeProvider::GitLab;
    }
    if host.contains("github") {
        return ForgeProvider::GitHub;
    }

    let configured = config.and_then(|config| {
        config.configured_providers().into_iter().find(|provider| {
            config
                .provider(*provider)
                .and_then(|p| url_host(&p.base_url))
                .is_some_and(|h| h.eq_ignore_ascii_case(&host))
        })
    });

    configured.unwrap_or(ForgeProvider::GitHub)
}

/// Create a forge for a provider with a plaintext token.
///
/// `base_url` is the stored base URL for the provider (API root for GitHub,
/// instance root for GitLab).
///
/// # Errors
///
/// `AuthFailed` if the token cannot be used in a request header.
pub fn create_forge(
    provider: ForgeProvider,
    token: &str,
    base_url: &str,
    ctx: &RepositoryContext,
) -> Result<Box<dyn Forge>, ForgeError> {
    match provider {
        ForgeProvider::GitHub => Ok(Box::new(GitHubForge::with_api_base(
            token,
            ctx.owner.as_str(),
            ctx.name.as_str(),
            base_url,
        )?)),
        ForgeProvider::GitLab => Ok(Box::new(GitLabForge::with_instance_url(
            token,
            ctx.owner.as_str(),
            ctx.name.as_str(),
            base_url,
        )?)),
    }
}

/// An authenticated forge client.
pub struct Connection {
    pub provider: ForgeProvider,
    /// Handle of the authenticated user
    pub user: String,
    pub forge: Box<dyn Forge>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("provider", &self.provider)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Build an authenticated forge for a repository.
///
/// Detects the provider, loads its stored settings, decrypts the token, and
/// performs one identity check.
///
/// # Errors
///
/// - `NotConfigured` if there is no stored login for the provider
/// - `AuthFailed` if the token cannot be decrypted or is rejected
/// - `Transient` if the provider cannot be reached
pub async fn connect(
    ctx: &RepositoryContext,
    config: &ForgeConfig,
    secrets: &SecretStore,
) -> Result<Connection, ForgeError> {
    let provider = detect_provider(ctx, Some(config));
    tracing::debug!(%provider, host = %ctx.host, "selected provider");

    let stored = config
        .provider(provider)
        .ok_or_else(|| ForgeError::NotConfigured {
            provider: provider.name().to_string(),
        })?;

    let token = secrets.decrypt(&stored.encrypted_token).map_err(|e| {
        ForgeError::AuthFailed(format!(
            "stored {} token is unreadable ({}); run `gitpr login --provider {}` again",
            provider, e, provider
        ))
    })?;

    let forge = create_forge(provider, &token, &stored.base_url, ctx)?;

    let user = match forge.current_user().await {
        Ok(user) => user,
        Err(ForgeError::AuthFailed(msg)) | Err(ForgeError::PermissionDenied(msg)) => {
            return Err(ForgeError::AuthFailed(msg))
        }
        Err(e) => return Err(e),
    };

    tracing::debug!(%provider, %user, "authenticated");
    Ok(Connection {
        provider,
        user,
        forge,
    })
}

/// Host part of an http(s) URL, without port.
fn url_host(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed.host_str().map(str::to_string)
}
