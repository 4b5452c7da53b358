//! forge::traits
//!
//! Forge trait definition and the canonical entity model.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! All methods return `Result` so callers can map each [`ForgeError`] kind to
//! its own remediation.
//!
//! Provider-specific response shapes never cross this boundary: every
//! operation returns [`ChangeRequest`] / [`FileChange`] values built by
//! `forge::normalize`.
//!
//! # Example
//!
//! ```ignore
//! use gitpr::forge::{Forge, CreateChangeRequest};
//!
//! async fn open(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let cr = forge.create_change_request(CreateChangeRequest {
//!         title: "Add feature".to_string(),
//!         body: "Description".to_string(),
//!         source_branch: "feature".to_string(),
//!         target_branch: "main".to_string(),
//!         draft: false,
//!     }).await?;
//!     println!("Created #{}: {}", cr.number, cr.url);
//!     Ok(())
//! }
//! ```

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use super::factory::ForgeProvider;

/// Errors from forge operations.
///
/// Every variant is a distinct failure kind with its own remediation; see
/// [`ForgeError::is_retryable`].
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// Invalid or expired credential, or a token that cannot be decrypted.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Authenticated, but not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Repository or other resource absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The change request number does not exist in the repository.
    #[error("change request #{number} not found")]
    ChangeRequestNotFound {
        /// The requested number
        number: u64,
    },

    /// No such branch upstream.
    #[error("remote branch not found: {branch}")]
    BranchNotFound {
        /// Branch name
        branch: String,
    },

    /// The provider rejected a create.
    #[error("create rejected: {0}")]
    CreateFailed(String),

    /// The provider rejected an update.
    #[error("update rejected: {0}")]
    UpdateFailed(String),

    /// Network failure, timeout, rate limit, or server error; safe to retry.
    #[error("transient error: {0}")]
    Transient(String),

    /// The provider returned data that cannot be mapped.
    #[error("unexpected response from provider: {0}")]
    Normalization(String),

    /// No stored configuration for the provider.
    #[error("{provider} is not configured; run `gitpr login --provider {provider}`")]
    NotConfigured {
        /// Provider name
        provider: String,
    },

    /// Stored configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },
}

impl ForgeError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ForgeError::Transient(_))
    }
}

/// Change request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeState {
    /// Open and awaiting review/merge
    Open,
    /// Closed without being merged
    Closed,
    /// Merged
    Merged,
}

impl std::fmt::Display for ChangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeState::Open => write!(f, "open"),
            ChangeState::Closed => write!(f, "closed"),
            ChangeState::Merged => write!(f, "merged"),
        }
    }
}

/// A pull request or merge request, provider-agnostic.
///
/// Constructed fresh on every fetch. Merge status is derived from
/// [`ChangeRequest::state`], so the two cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    /// Provider-assigned number (GitHub `number`, GitLab `iid`)
    pub number: u64,
    pub title: String,
    /// Description; empty when the provider has none
    pub body: String,
    /// Web URL
    pub url: String,
    pub state: ChangeState,
    /// Author handle
    pub author: String,
    /// Branch the change originates from
    pub source_branch: String,
    /// Branch the change targets
    pub target_branch: String,
    pub draft: bool,
}

impl ChangeRequest {
    /// True iff the state is [`ChangeState::Merged`].
    pub fn is_merged(&self) -> bool {
        self.state == ChangeState::Merged
    }
}

/// How a file was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "added"),
            ChangeKind::Modified => write!(f, "modified"),
            ChangeKind::Deleted => write!(f, "deleted"),
            ChangeKind::Renamed => write!(f, "renamed"),
        }
    }
}

/// One file touched by a change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path after the change
    pub path: String,
    pub kind: ChangeKind,
    pub lines_added: u64,
    pub lines_removed: u64,
    /// Unified diff; `None` for binary or oversized files
    pub patch: Option<String>,
}

/// Request to create a change request.
#[derive(Debug, Clone)]
pub struct CreateChangeRequest {
    pub title: String,
    pub body: String,
    /// Branch with the changes
    pub source_branch: String,
    /// Branch to merge into
    pub target_branch: String,
    /// Create as draft
    pub draft: bool,
}

/// Request to edit a change request.
///
/// `None` or empty fields are left untouched on the provider.
#[derive(Debug, Clone, Default)]
pub struct EditChangeRequest {
    pub number: u64,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl EditChangeRequest {
    /// The new title, if one was supplied and is non-empty.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|s| !s.is_empty())
    }

    /// The new body, if one was supplied and is non-empty.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref().filter(|s| !s.is_empty())
    }

    /// True if there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.title().is_none() && self.body().is_none()
    }
}

/// Review verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    RequestChanges,
    Comment,
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewDecision::Approve => write!(f, "approve"),
            ReviewDecision::RequestChanges => write!(f, "request-changes"),
            ReviewDecision::Comment => write!(f, "comment"),
        }
    }
}

/// What a review submission actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The review was recorded as requested.
    Submitted,
    /// The native approval was rejected; the message was posted as a comment.
    ApprovalFallback {
        /// Why the approval was rejected
        reason: String,
    },
}

/// The Forge trait for interacting with remote hosting services.
///
/// One implementation per provider, selected at runtime by
/// `forge::connect` / [`create_forge`](super::create_forge).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Callers should handle:
/// - `AuthFailed`: re-run login
/// - `PermissionDenied`: check repository access
/// - `NotFound` / `ChangeRequestNotFound` / `BranchNotFound`: check the argument
/// - `Transient`: retry later
#[async_trait]
pub trait Forge: Send + Sync {
    /// Which provider this client talks to.
    fn provider(&self) -> ForgeProvider;

    /// Handle of the authenticated user.
    ///
    /// Also serves as the lightweight identity check after construction.
    async fn current_user(&self) -> Result<String, ForgeError>;

    /// Create a new change request.
    ///
    /// # Errors
    ///
    /// - `CreateFailed` carrying the provider's diagnostic text when the
    ///   provider rejects the request (e.g. source branch missing)
    async fn create_change_request(
        &self,
        request: CreateChangeRequest,
    ) -> Result<ChangeRequest, ForgeError>;

    /// Get a change request by number.
    ///
    /// # Errors
    ///
    /// - `ChangeRequestNotFound` if the number does not exist
    async fn get_change_request(&self, number: u64) -> Result<ChangeRequest, ForgeError>;

    /// List every file touched by a change request, in provider order.
    ///
    /// Pagination is resolved before returning.
    async fn list_file_changes(&self, number: u64) -> Result<Vec<FileChange>, ForgeError>;

    /// Update title and/or body.
    ///
    /// With nothing to update, returns the current change request unchanged.
    ///
    /// # Errors
    ///
    /// - `ChangeRequestNotFound`, `PermissionDenied`, `UpdateFailed`
    async fn edit_change_request(
        &self,
        request: EditChangeRequest,
    ) -> Result<ChangeRequest, ForgeError>;

    /// Add a comment. Not idempotent.
    async fn add_comment(&self, number: u64, body: &str) -> Result<(), ForgeError>;

    /// Submit a review.
    ///
    /// An approval the provider rejects degrades to a plain comment and
    /// reports [`ReviewOutcome::ApprovalFallback`].
    async fn submit_review(
        &self,
        number: u64,
        decision: ReviewDecision,
        body: &str,
    ) -> Result<ReviewOutcome, ForgeError>;

    /// Source branches of all merged change requests, each once.
    async fn list_merged_source_branches(&self) -> Result<BTreeSet<String>, ForgeError>;

    /// Delete a branch upstream. Destructive; only on explicit request.
    ///
    /// # Errors
    ///
    /// - `BranchNotFound` if the branch does not exist upstream
    async fn delete_remote_branch(&self, branch: &str) -> Result<(), ForgeError>;
}
