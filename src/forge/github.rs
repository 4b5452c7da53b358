//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Endpoints
//!
//! | Operation               | Request                                        |
//! |-------------------------|------------------------------------------------|
//! | current user            | `GET /user`                                    |
//! | create                  | `POST /repos/{o}/{r}/pulls`                    |
//! | get                     | `GET /repos/{o}/{r}/pulls/{n}`                 |
//! | files                   | `GET /repos/{o}/{r}/pulls/{n}/files` (paged)   |
//! | edit                    | `PATCH /repos/{o}/{r}/pulls/{n}`               |
//! | comment                 | `POST /repos/{o}/{r}/issues/{n}/comments`      |
//! | review                  | `POST /repos/{o}/{r}/pulls/{n}/reviews`        |
//! | merged source branches  | `GET /repos/{o}/{r}/pulls?state=closed` (paged)|
//! | delete branch           | `DELETE /repos/{o}/{r}/git/refs/heads/{b}`     |
//!
//! GitHub Enterprise is supported through a custom API base
//! (`https://{host}/api/v3`).
//!
//! # Example
//!
//! ```ignore
//! use gitpr::forge::github::GitHubForge;
//! use gitpr::forge::Forge;
//!
//! let forge = GitHubForge::new("ghp_xxx", "acme", "widgets")?;
//! let cr = forge.get_change_request(42).await?;
//! ```

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::factory::ForgeProvider;
use super::http::{self, not_found_as_change_request, Operation, PER_PAGE, USER_AGENT_VALUE};
use super::normalize::{normalize, normalize_all, normalize_files};
use super::traits::{
    ChangeRequest, CreateChangeRequest, EditChangeRequest, FileChange, Forge, ForgeError,
    ReviewDecision, ReviewOutcome,
};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client carrying the auth headers
    client: Client,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// The token lives only inside the client's default headers.
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge for `owner/repo` on github.com.
    pub fn new(
        token: &str,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self, ForgeError> {
        Self::with_api_base(token, owner, repo, DEFAULT_API_BASE)
    }

    /// Create a forge with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (`https://github.example.com/api/v3`)
    /// and for tests against a mock server.
    ///
    /// # Errors
    ///
    /// `AuthFailed` if the token cannot be used as a header value.
    pub fn with_api_base(
        token: &str,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, ForgeError> {
        Ok(Self {
            client: http::build_client(Self::headers(token)?)?,
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get the repository owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build common headers for API requests.
    fn headers(token: &str) -> Result<HeaderMap, ForgeError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value, ForgeError> {
        let response = self.client.get(url).send().await.map_err(http::send_error)?;
        http::handle_response(response, Operation::Read).await
    }

    /// Post an issue comment (the conversation tab of a pull request).
    async fn post_issue_comment(&self, number: u64, body: &str) -> Result<(), ForgeError> {
        let url = self.repo_url(&format!("issues/{}/comments", number));
        let response = self
            .client
            .post(&url)
            .json(&CommentBody { body })
            .send()
            .await
            .map_err(http::send_error)?;

        http::expect_success(response, Operation::Create)
            .await
            .map_err(|e| not_found_as_change_request(e, number))
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn provider(&self) -> ForgeProvider {
        ForgeProvider::GitHub
    }

    async fn current_user(&self) -> Result<String, ForgeError> {
        let url = format!("{}/user", self.api_base);
        let response = self.client.get(&url).send().await.map_err(http::send_error)?;
        let user: GitHubLogin = http::handle_response(response, Operation::Read).await?;
        Ok(user.login)
    }

    async fn create_change_request(
        &self,
        request: CreateChangeRequest,
    ) -> Result<ChangeRequest, ForgeError> {
        let url = self.repo_url("pulls");

        let body = CreatePrBody {
            title: &request.title,
            body: &request.body,
            head: &request.source_branch,
            base: &request.target_branch,
            draft: request.draft,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(http::send_error)?;

        let raw: Value = http::handle_response(response, Operation::Create)
            .await
            .map_err(http::create_rejection)?;
        let cr = normalize(ForgeProvider::GitHub, raw)?;

        tracing::info!(number = cr.number, draft = cr.draft, "created pull request");
        Ok(cr)
    }

    async fn get_change_request(&self, number: u64) -> Result<ChangeRequest, ForgeError> {
        let raw = self
            .get_json(&self.repo_url(&format!("pulls/{}", number)))
            .await
            .map_err(|e| not_found_as_change_request(e, number))?;
        normalize(ForgeProvider::GitHub, raw)
    }

    async fn list_file_changes(&self, number: u64) -> Result<Vec<FileChange>, ForgeError> {
        let mut files = Vec::new();
        let mut page: u32 = 1;

        loop {
            let url = self.repo_url(&format!(
                "pulls/{}/files?per_page={}&page={}",
                number, PER_PAGE, page
            ));
            let raw = self
                .get_json(&url)
                .await
                .map_err(|e| not_found_as_change_request(e, number))?;

            let page_files = normalize_files(ForgeProvider::GitHub, raw)?;
            let page_count = page_files.len();
            files.extend(page_files);

            if page_count < PER_PAGE {
                break;
            }
            page += 1;
        }

        tracing::debug!(number, files = files.len(), "listed pull request files");
        Ok(files)
    }

    async fn edit_change_request(
        &self,
        request: EditChangeRequest,
    ) -> Result<ChangeRequest, ForgeError> {
        if request.is_empty() {
            return self.get_change_request(request.number).await;
        }

        let url = self.repo_url(&format!("pulls/{}", request.number));
        let body = UpdatePrBody {
            title: request.title(),
            body: request.body(),
        };

        let response = self
            .client
            .patch(&url)
            .json(&body)
            .send()
            .await
            .map_err(http::send_error)?;

        let raw: Value = http::handle_response(response, Operation::Update)
            .await
            .map_err(|e| not_found_as_change_request(e, request.number))?;
        normalize(ForgeProvider::GitHub, raw)
    }

    async fn add_comment(&self, number: u64, body: &str) -> Result<(), ForgeError> {
        self.post_issue_comment(number, body).await
    }

    async fn submit_review(
        &self,
        number: u64,
        decision: ReviewDecision,
        body: &str,
    ) -> Result<ReviewOutcome, ForgeError> {
        let url = self.repo_url(&format!("pulls/{}/reviews", number));
        let event = match decision {
            ReviewDecision::Approve => "APPROVE",
            ReviewDecision::RequestChanges => "REQUEST_CHANGES",
            ReviewDecision::Comment => "COMMENT",
        };

        let response = self
            .client
            .post(&url)
            .json(&ReviewBody { body, event })
            .send()
            .await
            .map_err(http::send_error)?;

        match http::expect_success(response, Operation::Create).await {
            Ok(()) => Ok(ReviewOutcome::Submitted),
            // e.g. "Can not approve your own pull request"
            Err(ForgeError::CreateFailed(reason)) if decision == ReviewDecision::Approve => {
                tracing::warn!(number, %reason, "approval rejected, posting comment instead");
                self.post_issue_comment(number, body).await?;
                Ok(ReviewOutcome::ApprovalFallback { reason })
            }
            Err(e) => Err(not_found_as_change_request(e, number)),
        }
    }

    async fn list_merged_source_branches(&self) -> Result<BTreeSet<String>, ForgeError> {
        let mut branches = BTreeSet::new();
        let mut page: u32 = 1;

        loop {
            let url = self.repo_url(&format!(
                "pulls?state=closed&per_page={}&page={}",
                PER_PAGE, page
            ));
            let prs = normalize_all(ForgeProvider::GitHub, self.get_json(&url).await?)?;
            let page_count = prs.len();

            branches.extend(
                prs.into_iter()
                    .filter(ChangeRequest::is_merged)
                    .map(|pr| pr.source_branch),
            );

            if page_count < PER_PAGE {
                break;
            }
            page += 1;
        }

        tracing::debug!(count = branches.len(), "collected merged source branches");
        Ok(branches)
    }

    async fn delete_remote_branch(&self, branch: &str) -> Result<(), ForgeError> {
        let url = self.repo_url(&format!("git/refs/heads/{}", encode_ref_path(branch)));
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(http::send_error)?;

        match http::expect_success(response, Operation::Update).await {
            Ok(()) => {
                tracing::info!(branch, "deleted remote branch");
                Ok(())
            }
            Err(e) if is_missing_ref(&e) => Err(ForgeError::BranchNotFound {
                branch: branch.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

/// Whether a failed ref deletion means the ref is absent.
///
/// GitHub answers 422 "Reference does not exist" for a missing ref; other
/// 422s (protected branches, for one) are real refusals.
fn is_missing_ref(err: &ForgeError) -> bool {
    match err {
        ForgeError::NotFound(_) => true,
        ForgeError::UpdateFailed(message) => message
            .to_ascii_lowercase()
            .contains("reference does not exist"),
        _ => false,
    }
}

/// Percent-encode each segment of a branch name, keeping `/` separators.
fn encode_ref_path(branch: &str) -> String {
    branch
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a PR.
#[derive(Serialize)]
struct CreatePrBody<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
    draft: bool,
}

/// Request body for updating a PR.
#[derive(Serialize)]
struct UpdatePrBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct ReviewBody<'a> {
    body: &'a str,
    event: &'a str,
}

#[derive(Deserialize)]
struct GitHubLogin {
    login: String,
}
