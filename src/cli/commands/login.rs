//! cli::commands::login
//!
//! Store a provider token for later commands.
//!
//! # Design
//!
//! - The token is encrypted with the installation key before it is written
//! - The token is NEVER printed to stdout/stderr
//! - Saving one provider merges into the existing config record
//!
//! # Example
//!
//! ```bash
//! # Interactive (prompts for token)
//! gitpr login --provider github
//!
//! # Non-interactive, self-hosted GitLab
//! gitpr login --provider gitlab --host gitlab.example.com --token glpat-xxxx
//! ```

use std::io::{self, Write};

use anyhow::{anyhow, bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config::{ConfigFile, ForgeConfig, ProviderConfig};
use crate::core::paths::AppPaths;
use crate::forge::ForgeProvider;
use crate::secrets::SecretStore;

/// Run the login command.
///
/// # Security
///
/// This function NEVER prints the token value. It only confirms success/failure.
pub fn login(
    ctx: &Context,
    provider: &str,
    host: Option<&str>,
    token: Option<&str>,
    webhook: Option<&str>,
) -> Result<()> {
    let provider = ForgeProvider::parse(provider).ok_or_else(|| {
        anyhow!(
            "Unsupported provider '{}'. Expected one of: {}.",
            provider,
            ForgeProvider::names().join(", ")
        )
    })?;

    let token_value = get_token(ctx, provider, token)?;
    validate_token(&token_value)?;

    let paths = AppPaths::resolve()?;
    let config = store_login(&paths, provider, host, &token_value, webhook)?;

    if !ctx.quiet {
        let base_url = config
            .provider(provider)
            .map(|p| p.base_url.as_str())
            .unwrap_or_default();
        println!("✔ {} token saved ({}).", provider, base_url);
        if webhook.is_some() {
            println!("✔ Notification webhook saved.");
        }
    }

    Ok(())
}

/// Encrypt and persist a login, returning the resulting config.
pub fn store_login(
    paths: &AppPaths,
    provider: ForgeProvider,
    host: Option<&str>,
    token: &str,
    webhook: Option<&str>,
) -> Result<ForgeConfig> {
    let host = host.map(normalize_host).filter(|h| !h.is_empty());

    let encrypted_token = SecretStore::from_paths(paths)
        .encrypt(token)
        .context("Failed to encrypt token")?;

    let entry = ProviderConfig {
        encrypted_token,
        base_url: provider.base_url(host.as_deref()),
    };

    let config = ConfigFile::from_paths(paths)
        .update(|config| {
            config.set_provider(provider, entry);
            if let Some(webhook) = webhook {
                let webhook = webhook.trim();
                config.notification_webhook =
                    (!webhook.is_empty()).then(|| webhook.to_string());
            }
        })
        .context("Failed to save configuration")?;

    tracing::debug!(%provider, "login stored");
    Ok(config)
}

/// Accept `example.com`, `https://example.com/`, or `example.com/`.
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);
    host.trim_end_matches('/').to_string()
}

/// Get token from argument or interactive prompt.
fn get_token(ctx: &Context, provider: ForgeProvider, token_arg: Option<&str>) -> Result<String> {
    if let Some(t) = token_arg {
        return Ok(t.trim().to_string());
    }

    if !ctx.interactive {
        bail!("Token required. Use --token <TOKEN> or run interactively.");
    }

    print!("{} access token: ", provider);
    io::stdout().flush()?;

    let token = rpassword::read_password().context("Failed to read token")?;
    Ok(token.trim().to_string())
}

/// Validate token format (basic checks).
///
/// The token is not checked against the API here; `whoami` does that.
fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        bail!("Token cannot be empty.");
    }

    if token.contains(char::is_whitespace) {
        bail!("Token should not contain whitespace.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths() -> (TempDir, AppPaths) {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::new(dir.path().join("gitpr"));
        (dir, paths)
    }

    #[test]
    fn stores_encrypted_token() {
        let (_dir, paths) = paths();

        let config =
            store_login(&paths, ForgeProvider::GitHub, None, "ghp_secret123", None).unwrap();

        let entry = config.provider(ForgeProvider::GitHub).unwrap();
        assert_eq!(entry.base_url, "https://api.github.com");
        assert_ne!(entry.encrypted_token, "ghp_secret123");

        let raw = std::fs::read_to_string(paths.config_file()).unwrap();
        assert!(!raw.contains("ghp_secret123"));

        let decrypted = SecretStore::from_paths(&paths)
            .decrypt(&entry.encrypted_token)
            .unwrap();
        assert_eq!(decrypted, "ghp_secret123");
    }

    #[test]
    fn second_provider_is_merged() {
        let (_dir, paths) = paths();

        store_login(&paths, ForgeProvider::GitHub, None, "ghp_a", Some("https://hooks.example.com/x"))
            .unwrap();
        let config = store_login(
            &paths,
            ForgeProvider::GitLab,
            Some("https://gitlab.example.com/"),
            "glpat-b",
            None,
        )
        .unwrap();

        assert!(config.provider(ForgeProvider::GitHub).is_some());
        assert_eq!(
            config.provider(ForgeProvider::GitLab).unwrap().base_url,
            "https://gitlab.example.com"
        );
        assert_eq!(
            config.notification_webhook.as_deref(),
            Some("https://hooks.example.com/x")
        );
    }

    #[test]
    fn enterprise_host() {
        let (_dir, paths) = paths();
        let config = store_login(
            &paths,
            ForgeProvider::GitHub,
            Some("github.example.com"),
            "ghp_a",
            None,
        )
        .unwrap();
        assert_eq!(
            config.provider(ForgeProvider::GitHub).unwrap().base_url,
            "https://github.example.com/api/v3"
        );
    }

    #[test]
    fn empty_webhook_clears_it() {
        let (_dir, paths) = paths();
        store_login(&paths, ForgeProvider::GitHub, None, "t", Some("https://h.example/x")).unwrap();
        let config = store_login(&paths, ForgeProvider::GitHub, None, "t", Some("")).unwrap();
        assert!(config.notification_webhook.is_none());
    }

    #[test]
    fn token_validation() {
        assert!(validate_token("").is_err());
        assert!(validate_token("abc def").is_err());
        assert!(validate_token("ghp_abc").is_ok());
    }

    #[test]
    fn non_interactive_requires_token() {
        let ctx = Context::default();
        assert!(get_token(&ctx, ForgeProvider::GitHub, None).is_err());
        assert_eq!(
            get_token(&ctx, ForgeProvider::GitHub, Some(" tok \n")).unwrap(),
            "tok"
        );
    }

    #[test]
    fn host_normalization() {
        assert_eq!(normalize_host("https://gitlab.example.com/"), "gitlab.example.com");
        assert_eq!(normalize_host(" example.com "), "example.com");
    }
}
