//! Integration tests for building an authenticated forge from stored config.

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gitpr::core::config::{ForgeConfig, ProviderConfig};
use gitpr::forge::{connect, ForgeError, ForgeProvider};
use gitpr::git::{parse_remote_url, RepositoryContext};
use gitpr::secrets::SecretStore;

struct Fixture {
    _dir: TempDir,
    secrets: SecretStore,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let secrets = SecretStore::new(dir.path().join(".key"));
        Self { _dir: dir, secrets }
    }

    fn config(&self, provider: ForgeProvider, token: &str, base_url: &str) -> ForgeConfig {
        let mut config = ForgeConfig::default();
        config.set_provider(
            provider,
            ProviderConfig {
                encrypted_token: self.secrets.encrypt(token).unwrap(),
                base_url: base_url.to_string(),
            },
        );
        config
    }
}

fn github_repo() -> RepositoryContext {
    parse_remote_url("git@github.com:acme/widgets.git").unwrap()
}

#[tokio::test]
async fn github_connection_reports_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer ghp_stored"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .expect(1)
        .mount(&server)
        .await;

    let fx = Fixture::new();
    let config = fx.config(ForgeProvider::GitHub, "ghp_stored", &server.uri());

    let conn = connect(&github_repo(), &config, &fx.secrets).await.unwrap();

    assert_eq!(conn.provider, ForgeProvider::GitHub);
    assert_eq!(conn.user, "octocat");
    assert_eq!(conn.forge.provider(), ForgeProvider::GitHub);
}

#[tokio::test]
async fn gitlab_connection_uses_instance_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/user"))
        .and(header("private-token", "glpat-stored"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "tanuki"})))
        .expect(1)
        .mount(&server)
        .await;

    let fx = Fixture::new();
    let config = fx.config(ForgeProvider::GitLab, "glpat-stored", &server.uri());
    let repo = parse_remote_url("https://gitlab.com/acme/widgets.git").unwrap();

    let conn = connect(&repo, &config, &fx.secrets).await.unwrap();
    assert_eq!(conn.provider, ForgeProvider::GitLab);
    assert_eq!(conn.user, "tanuki");
}

#[tokio::test]
async fn rejected_token_is_auth_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&server)
        .await;

    let fx = Fixture::new();
    let config = fx.config(ForgeProvider::GitHub, "ghp_revoked", &server.uri());

    let err = connect(&github_repo(), &config, &fx.secrets).await.unwrap_err();
    assert!(matches!(err, ForgeError::AuthFailed(_)));
}

#[tokio::test]
async fn forbidden_token_is_auth_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let fx = Fixture::new();
    let config = fx.config(ForgeProvider::GitHub, "ghp_scopeless", &server.uri());

    let err = connect(&github_repo(), &config, &fx.secrets).await.unwrap_err();
    assert!(matches!(err, ForgeError::AuthFailed(_)));
}

#[tokio::test]
async fn missing_login_is_not_configured() {
    let fx = Fixture::new();
    let config = fx.config(ForgeProvider::GitLab, "glpat", "https://gitlab.com");

    let err = connect(&github_repo(), &config, &fx.secrets).await.unwrap_err();

    assert!(matches!(err, ForgeError::NotConfigured { ref provider } if provider == "github"));
    assert!(err.to_string().contains("gitpr login --provider github"));
}

#[tokio::test]
async fn token_sealed_with_another_key_is_auth_failed() {
    let other = Fixture::new();
    let config = other.config(ForgeProvider::GitHub, "ghp_x", "https://api.github.com");

    let fx = Fixture::new();
    let err = connect(&github_repo(), &config, &fx.secrets).await.unwrap_err();

    assert!(matches!(err, ForgeError::AuthFailed(ref m) if m.contains("login")));
    assert!(!err.to_string().contains("ghp_x"));
}
