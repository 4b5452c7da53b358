//! End-to-end tests for the `gitpr` binary.
//!
//! Provider APIs are served by a mock HTTP server; the config directory is
//! redirected into a temp dir with `GITPR_CONFIG_DIR`.

use std::path::Path;

use assert_cmd::assert::{Assert, OutputAssertExt};
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gitpr::core::config::{ConfigFile, ForgeConfig, ProviderConfig};
use gitpr::core::paths::AppPaths;
use gitpr::forge::ForgeProvider;
use gitpr::secrets::SecretStore;

/// A config dir plus a repository whose origin points at GitHub.
struct Env {
    config_dir: TempDir,
    repo_dir: TempDir,
}

impl Env {
    fn new(remote: &str) -> Self {
        let config_dir = TempDir::new().unwrap();
        let repo_dir = TempDir::new().unwrap();
        init_repo(repo_dir.path(), remote);
        Self {
            config_dir,
            repo_dir,
        }
    }

    fn paths(&self) -> AppPaths {
        AppPaths::new(self.config_dir.path().to_path_buf())
    }

    /// Store a login whose API base is the mock server.
    fn login(&self, provider: ForgeProvider, token: &str, base_url: &str, webhook: Option<String>) {
        let paths = self.paths();
        let mut config = ForgeConfig::default();
        config.set_provider(
            provider,
            ProviderConfig {
                encrypted_token: SecretStore::from_paths(&paths).encrypt(token).unwrap(),
                base_url: base_url.to_string(),
            },
        );
        config.notification_webhook = webhook;
        ConfigFile::from_paths(&paths).save(&config).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gitpr").unwrap();
        cmd.env("GITPR_CONFIG_DIR", self.config_dir.path())
            .env_remove("RUST_LOG")
            .arg("--cwd")
            .arg(self.repo_dir.path());
        cmd
    }
}

fn init_repo(dir: &Path, remote: &str) {
    let repo = git2::Repository::init(dir).unwrap();
    let sig = git2::Signature::now("Test", "test@example.com").unwrap();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let oid = repo
        .commit(None, &sig, &sig, "initial", &tree, &[])
        .unwrap();
    let commit = repo.find_commit(oid).unwrap();
    repo.branch("main", &commit, true).unwrap();
    repo.set_head("refs/heads/main").unwrap();
    repo.branch("feature", &commit, false).unwrap();
    repo.remote("origin", remote).unwrap();
}

fn pull(number: u64, merged: bool) -> serde_json::Value {
    json!({
        "number": number,
        "html_url": format!("https://github.com/acme/widgets/pull/{}", number),
        "state": if merged { "closed" } else { "open" },
        "title": "Add feature",
        "body": "Details",
        "user": {"login": "octocat"},
        "head": {"ref": "feature"},
        "base": {"ref": "main"},
        "draft": false,
        "merged": merged
    })
}

async fn github_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .mount(&server)
        .await;
    server
}

/// Run a blocking command while the mock server keeps serving.
async fn run(mut cmd: Command) -> Assert {
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .unwrap()
        .unwrap();
    output.assert()
}

mod offline {
    use super::*;

    #[test]
    fn help_lists_commands() {
        Command::cargo_bin("gitpr")
            .unwrap()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("create"))
            .stdout(predicate::str::contains("cleanup"))
            .stdout(predicate::str::contains("review"));
    }

    #[test]
    fn completion_script() {
        Command::cargo_bin("gitpr")
            .unwrap()
            .args(["completion", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("gitpr"));
    }

    #[test]
    fn login_writes_encrypted_config() {
        let env = Env::new("git@github.com:acme/widgets.git");

        env.cmd()
            .args(["login", "--provider", "github", "--token", "ghp_supersecret"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ghp_supersecret").not());

        let raw = std::fs::read_to_string(env.paths().config_file()).unwrap();
        assert!(raw.contains("\"github\""));
        assert!(!raw.contains("ghp_supersecret"));
        assert!(env.paths().key_file().exists());
    }

    #[test]
    fn login_rejects_unknown_provider() {
        let env = Env::new("git@github.com:acme/widgets.git");
        env.cmd()
            .args(["login", "--provider", "bitbucket", "--token", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported provider"));
    }

    #[test]
    fn login_without_token_needs_a_terminal() {
        let env = Env::new("git@github.com:acme/widgets.git");
        env.cmd()
            .args(["login", "--provider", "gitlab"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Token required"));
    }

    #[test]
    fn outside_a_repository() {
        let env = Env::new("git@github.com:acme/widgets.git");
        let elsewhere = TempDir::new().unwrap();

        Command::cargo_bin("gitpr")
            .unwrap()
            .env("GITPR_CONFIG_DIR", env.config_dir.path())
            .arg("--cwd")
            .arg(elsewhere.path())
            .args(["view", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not a git repository"));
    }

    #[test]
    fn not_logged_in_suggests_login() {
        let env = Env::new("git@github.com:acme/widgets.git");
        env.cmd()
            .args(["view", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("github is not configured"))
            .stderr(predicate::str::contains("hint:"));
    }

    #[test]
    fn edit_needs_a_field() {
        let env = Env::new("git@github.com:acme/widgets.git");
        env.cmd()
            .args(["edit", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Nothing to change"));
    }
}

mod online {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn whoami_prints_user() {
        let server = github_server().await;
        let env = Env::new("git@github.com:acme/widgets.git");
        env.login(ForgeProvider::GitHub, "ghp_t", &server.uri(), None);

        let mut cmd = env.cmd();
        cmd.args(["-q", "whoami"]);
        run(cmd).await.success().stdout("octocat\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn view_prints_change_request() {
        let server = github_server().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pull(5, true)))
            .mount(&server)
            .await;

        let env = Env::new("git@github.com:acme/widgets.git");
        env.login(ForgeProvider::GitHub, "ghp_t", &server.uri(), None);

        let mut cmd = env.cmd();
        cmd.args(["view", "5"]);
        run(cmd)
            .await
            .success()
            .stdout(predicate::str::contains("#5 Add feature"))
            .stdout(predicate::str::contains("State:  merged"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_change_request_exits_nonzero() {
        let server = github_server().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/77"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let env = Env::new("https://github.com/acme/widgets.git");
        env.login(ForgeProvider::GitHub, "ghp_t", &server.uri(), None);

        let mut cmd = env.cmd();
        cmd.args(["view", "77"]);
        run(cmd)
            .await
            .failure()
            .stderr(predicate::str::contains("change request #77 not found"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_prints_url_and_notifies() {
        let server = github_server().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/pulls"))
            .respond_with(ResponseTemplate::new(201).set_body_json(pull(12, false)))
            .expect(1)
            .mount(&server)
            .await;

        let hook = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&hook)
            .await;

        let env = Env::new("git@github.com:acme/widgets.git");
        env.login(
            ForgeProvider::GitHub,
            "ghp_t",
            &server.uri(),
            Some(format!("{}/hook", hook.uri())),
        );

        let mut cmd = env.cmd();
        cmd.args([
            "create", "--from", "feature", "--to", "main", "--title", "Add feature",
        ]);
        run(cmd)
            .await
            .success()
            .stdout(predicate::str::contains(
                "https://github.com/acme/widgets/pull/12",
            ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_notification_does_not_fail_create() {
        let server = github_server().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/pulls"))
            .respond_with(ResponseTemplate::new(201).set_body_json(pull(13, false)))
            .mount(&server)
            .await;

        let hook = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&hook)
            .await;

        let env = Env::new("git@github.com:acme/widgets.git");
        env.login(
            ForgeProvider::GitHub,
            "ghp_t",
            &server.uri(),
            Some(format!("{}/hook", hook.uri())),
        );

        let mut cmd = env.cmd();
        cmd.args([
            "create", "--from", "feature", "--to", "main", "--title", "Add feature",
        ]);
        run(cmd)
            .await
            .success()
            .stderr(predicate::str::contains("notification not sent"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn review_request_changes() {
        let server = github_server().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/pulls/5/reviews"))
            .and(body_json(json!({"body": "Needs tests", "event": "REQUEST_CHANGES"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let env = Env::new("git@github.com:acme/widgets.git");
        env.login(ForgeProvider::GitHub, "ghp_t", &server.uri(), None);

        let mut cmd = env.cmd();
        cmd.args([
            "review",
            "5",
            "--action",
            "request-changes",
            "--message",
            "Needs tests",
        ]);
        run(cmd).await.success();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cleanup_deletes_merged_branch_everywhere() {
        let server = github_server().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([pull(5, true)])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/repos/acme/widgets/git/refs/heads/feature"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let env = Env::new("git@github.com:acme/widgets.git");
        env.login(ForgeProvider::GitHub, "ghp_t", &server.uri(), None);

        let mut cmd = env.cmd();
        cmd.args(["cleanup", "feature", "--remote", "--local"]);
        run(cmd)
            .await
            .success()
            .stdout(predicate::str::contains("is merged upstream"))
            .stdout(predicate::str::contains("Local branch deleted"));

        let repo = git2::Repository::open(env.repo_dir.path()).unwrap();
        assert!(repo
            .find_branch("feature", git2::BranchType::Local)
            .is_err());
    }
}
