//! forge::gitlab
//!
//! GitLab forge implementation using the REST API (v4).
//!
//! # Design
//!
//! Merge requests are addressed by their project-scoped `iid`, and the
//! project by its URL-encoded full path (`group%2Fsubgroup%2Fproject`), so
//! no project-id lookup is needed.
//!
//! GitLab differs from GitHub in three places this client absorbs:
//! - **Draft**: there is no draft flag on create; the title is prefixed
//!   with `Draft: `, which GitLab itself interprets as draft.
//! - **Review**: approval is a separate action without a message. The
//!   message is always posted as a note; a rejected approval (already
//!   approved, approving your own MR, approvals not licensed) is logged and
//!   reported as [`ReviewOutcome::ApprovalFallback`].
//! - **Diffs**: `/changes` returns only unified diffs; line counts are
//!   derived from them (see [`count_diff_lines`](super::count_diff_lines)).
//!
//! # Example
//!
//! ```ignore
//! use gitpr::forge::gitlab::GitLabForge;
//!
//! let forge = GitLabForge::new("glpat-xxx", "mygroup", "myproject")?;
//! let mr = forge.get_change_request(7).await?;
//! ```

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::factory::ForgeProvider;
use super::http::{self, not_found_as_change_request, Operation, PER_PAGE, USER_AGENT_VALUE};
use super::normalize::{normalize, normalize_all, normalize_files};
use super::traits::{
    ChangeRequest, CreateChangeRequest, EditChangeRequest, FileChange, Forge, ForgeError,
    ReviewDecision, ReviewOutcome,
};

/// Default GitLab instance URL.
pub const DEFAULT_INSTANCE_URL: &str = "https://gitlab.com";

/// Title prefix that marks a merge request as draft.
pub const DRAFT_PREFIX: &str = "Draft: ";

const APPROVED_NOTE_PREFIX: &str = "✅ Approved: ";
const CHANGES_REQUESTED_NOTE_PREFIX: &str = "⛔ Requesting Changes: ";

/// GitLab forge implementation.
pub struct GitLabForge {
    /// HTTP client carrying the auth headers
    client: Client,
    /// Project owner (user or group path)
    owner: String,
    /// Project name
    project: String,
    /// API base URL (`<instance>/api/v4`)
    api_base: String,
}

impl std::fmt::Debug for GitLabForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabForge")
            .field("owner", &self.owner)
            .field("project", &self.project)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitLabForge {
    /// Create a forge for `owner/project` on gitlab.com.
    pub fn new(
        token: &str,
        owner: impl Into<String>,
        project: impl Into<String>,
    ) -> Result<Self, ForgeError> {
        Self::with_instance_url(token, owner, project, DEFAULT_INSTANCE_URL)
    }

    /// Create a forge for a self-hosted instance.
    ///
    /// `instance_url` is the web root (`https://gitlab.example.com`); the API
    /// lives under `/api/v4`.
    pub fn with_instance_url(
        token: &str,
        owner: impl Into<String>,
        project: impl Into<String>,
        instance_url: &str,
    ) -> Result<Self, ForgeError> {
        let api_base = format!("{}/api/v4", instance_url.trim_end_matches('/'));
        Ok(Self {
            client: http::build_client(Self::headers(token)?)?,
            owner: owner.into(),
            project: project.into(),
            api_base,
        })
    }

    /// Get the project owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the project name.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn headers(token: &str) -> Result<HeaderMap, ForgeError> {
        let mut auth = HeaderValue::from_str(token)
            .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("PRIVATE-TOKEN", auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    /// Build URL for a project endpoint.
    fn project_url(&self, path: &str) -> String {
        let id = format!("{}/{}", self.owner, self.project);
        format!(
            "{}/projects/{}/{}",
            self.api_base,
            urlencoding::encode(&id),
            path
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value, ForgeError> {
        let response = self.client.get(url).send().await.map_err(http::send_error)?;
        http::handle_response(response, Operation::Read).await
    }

    async fn post_note(&self, iid: u64, body: &str) -> Result<(), ForgeError> {
        let url = self.project_url(&format!("merge_requests/{}/notes", iid));
        let response = self
            .client
            .post(&url)
            .json(&NoteBody { body })
            .send()
            .await
            .map_err(http::send_error)?;

        http::expect_success(response, Operation::Create)
            .await
            .map_err(|e| not_found_as_change_request(e, iid))
    }

    async fn approve(&self, iid: u64) -> Result<(), ForgeError> {
        let url = self.project_url(&format!("merge_requests/{}/approve", iid));
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(http::send_error)?;
        http::expect_success(response, Operation::Update).await
    }
}

#[async_trait]
impl Forge for GitLabForge {
    fn provider(&self) -> ForgeProvider {
        ForgeProvider::GitLab
    }

    async fn current_user(&self) -> Result<String, ForgeError> {
        let url = format!("{}/user", self.api_base);
        let response = self.client.get(&url).send().await.map_err(http::send_error)?;
        let user: GitLabUsername = http::handle_response(response, Operation::Read).await?;
        Ok(user.username)
    }

    async fn create_change_request(
        &self,
        request: CreateChangeRequest,
    ) -> Result<ChangeRequest, ForgeError> {
        let title = if request.draft {
            format!("{}{}", DRAFT_PREFIX, request.title)
        } else {
            request.title.clone()
        };

        let body = CreateMrBody {
            source_branch: &request.source_branch,
            target_branch: &request.target_branch,
            title: &title,
            description: &request.body,
        };

        let response = self
            .client
            .post(self.project_url("merge_requests"))
            .json(&body)
            .send()
            .await
            .map_err(http::send_error)?;

        let raw: Value = http::handle_response(response, Operation::Create)
            .await
            .map_err(http::create_rejection)?;
        let cr = normalize(ForgeProvider::GitLab, raw)?;

        tracing::info!(number = cr.number, draft = cr.draft, "created merge request");
        Ok(cr)
    }

    async fn get_change_request(&self, number: u64) -> Result<ChangeRequest, ForgeError> {
        let raw = self
            .get_json(&self.project_url(&format!("merge_requests/{}", number)))
            .await
            .map_err(|e| not_found_as_change_request(e, number))?;
        normalize(ForgeProvider::GitLab, raw)
    }

    async fn list_file_changes(&self, number: u64) -> Result<Vec<FileChange>, ForgeError> {
        // `/changes` is not paginated: one response carries every file
        let raw = self
            .get_json(&self.project_url(&format!("merge_requests/{}/changes", number)))
            .await
            .map_err(|e| not_found_as_change_request(e, number))?;

        let files = normalize_files(ForgeProvider::GitLab, raw)?;
        tracing::debug!(number, files = files.len(), "listed merge request changes");
        Ok(files)
    }

    async fn edit_change_request(
        &self,
        request: EditChangeRequest,
    ) -> Result<ChangeRequest, ForgeError> {
        if request.is_empty() {
            return self.get_change_request(request.number).await;
        }

        let url = self.project_url(&format!("merge_requests/{}", request.number));
        let body = UpdateMrBody {
            title: request.title(),
            description: request.body(),
        };

        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(http::send_error)?;

        let raw: Value = http::handle_response(response, Operation::Update)
            .await
            .map_err(|e| not_found_as_change_request(e, request.number))?;
        normalize(ForgeProvider::GitLab, raw)
    }

    async fn add_comment(&self, number: u64, body: &str) -> Result<(), ForgeError> {
        self.post_note(number, body).await
    }

    async fn submit_review(
        &self,
        number: u64,
        decision: ReviewDecision,
        body: &str,
    ) -> Result<ReviewOutcome, ForgeError> {
        match decision {
            ReviewDecision::Approve => {
                let outcome = match self.approve(number).await {
                    Ok(()) => ReviewOutcome::Submitted,
                    Err(e) => {
                        tracing::warn!(number, error = %e, "approval rejected, posting note only");
                        ReviewOutcome::ApprovalFallback {
                            reason: e.to_string(),
                        }
                    }
                };
                self.post_note(number, &format!("{}{}", APPROVED_NOTE_PREFIX, body))
                    .await?;
                Ok(outcome)
            }
            ReviewDecision::RequestChanges => {
                self.post_note(
                    number,
                    &format!("{}{}", CHANGES_REQUESTED_NOTE_PREFIX, body),
                )
                .await?;
                Ok(ReviewOutcome::Submitted)
            }
            ReviewDecision::Comment => {
                self.post_note(number, body).await?;
                Ok(ReviewOutcome::Submitted)
            }
        }
    }

    async fn list_merged_source_branches(&self) -> Result<BTreeSet<String>, ForgeError> {
        let mut branches = BTreeSet::new();
        let mut page: u32 = 1;

        loop {
            let url = self.project_url(&format!(
                "merge_requests?state=merged&per_page={}&page={}",
                PER_PAGE, page
            ));
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(http::send_error)?;

            let next_header = next_page_header(&response);
            let raw: Value = http::handle_response(response, Operation::Read).await?;
            let mrs = normalize_all(ForgeProvider::GitLab, raw)?;
            let page_count = mrs.len();

            branches.extend(
                mrs.into_iter()
                    .filter(ChangeRequest::is_merged)
                    .map(|mr| mr.source_branch),
            );

            // X-Next-Page is omitted for large collections; fall back to page size
            let next = match next_header {
                Some(next) => next,
                None => (page_count >= PER_PAGE).then_some(page + 1),
            };
            match next {
                Some(n) if n > page => page = n,
                _ => break,
            }
        }

        tracing::debug!(count = branches.len(), "collected merged source branches");
        Ok(branches)
    }

    async fn delete_remote_branch(&self, branch: &str) -> Result<(), ForgeError> {
        let url = self.project_url(&format!(
            "repository/branches/{}",
            urlencoding::encode(branch)
        ));
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
            // "404 Branch Not Found"; a missing project keeps NotFound
            Err(ForgeError::NotFound(message))
                if message.to_ascii_lowercase().contains("branch") =>
            {
                Err(ForgeError::BranchNotFound {
                    branch: branch.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Read `X-Next-Page`.
///
/// `None`: header absent. `Some(None)`: present but empty (last page).
fn next_page_header(response: &Response) -> Option<Option<u32>> {
    let value = response.headers().get("x-next-page")?.to_str().ok()?;
    Some(value.trim().parse().ok())
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

#[derive(Serialize)]
struct CreateMrBody<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct UpdateMrBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct NoteBody<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct GitLabUsername {
    username: String,
}
