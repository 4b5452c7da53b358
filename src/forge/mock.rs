//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge provides a deterministic implementation of the `Forge` trait
//! for use in tests. It stores change requests, file listings, comments, and
//! remote branches in memory and allows configuring failure scenarios.
//!
//! # Example
//!
//! ```
//! use gitpr::forge::mock::MockForge;
//! use gitpr::forge::{ChangeState, CreateChangeRequest, Forge, ForgeProvider};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let forge = MockForge::new(ForgeProvider::GitHub);
//!
//! let cr = forge.create_change_request(CreateChangeRequest {
//!     title: "Add feature".to_string(),
//!     body: String::new(),
//!     source_branch: "feature".to_string(),
//!     target_branch: "main".to_string(),
//!     draft: false,
//! }).await.unwrap();
//!
//! assert_eq!(cr.number, 1);
//! assert_eq!(cr.state, ChangeState::Open);
//!
//! let retrieved = forge.get_change_request(1).await.unwrap();
//! assert_eq!(retrieved.title, "Add feature");
//! # });
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::factory::ForgeProvider;
use super::traits::{
    ChangeRequest, ChangeState, CreateChangeRequest, EditChangeRequest, FileChange, Forge,
    ForgeError, ReviewDecision, ReviewOutcome,
};

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockForge {
    provider: ForgeProvider,
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    user: String,
    change_requests: BTreeMap<u64, ChangeRequest>,
    files: HashMap<u64, Vec<FileChange>>,
    comments: Vec<(u64, String)>,
    remote_branches: BTreeSet<String>,
    next_number: u64,
    /// Reason to reject native approvals with, if set.
    approval_rejection: Option<String>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    CurrentUser(ForgeError),
    Create(ForgeError),
    Get(ForgeError),
    ListFiles(ForgeError),
    Edit(ForgeError),
    Comment(ForgeError),
    Review(ForgeError),
    ListMerged(ForgeError),
    DeleteBranch(ForgeError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CurrentUser,
    Create {
        source_branch: String,
        target_branch: String,
        title: String,
        draft: bool,
    },
    Get {
        number: u64,
    },
    ListFiles {
        number: u64,
    },
    Edit {
        number: u64,
        title: Option<String>,
        body: Option<String>,
    },
    Comment {
        number: u64,
        body: String,
    },
    Review {
        number: u64,
        decision: ReviewDecision,
        body: String,
    },
    ListMerged,
    DeleteBranch {
        branch: String,
    },
}

impl MockForge {
    /// Create a new empty mock forge.
    pub fn new(provider: ForgeProvider) -> Self {
        Self {
            provider,
            inner: Arc::new(Mutex::new(MockForgeInner {
                user: "mock-user".to_string(),
                change_requests: BTreeMap::new(),
                files: HashMap::new(),
                comments: Vec::new(),
                remote_branches: BTreeSet::new(),
                next_number: 1,
                approval_rejection: None,
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Seed existing change requests; new numbers continue after the highest.
    pub fn with_change_requests(self, crs: Vec<ChangeRequest>) -> Self {
        {
            let mut inner = self.state();
            for cr in crs {
                inner.next_number = inner.next_number.max(cr.number + 1);
                inner.change_requests.insert(cr.number, cr);
            }
        }
        self
    }

    /// Seed the file listing for a change request.
    pub fn with_files(self, number: u64, files: Vec<FileChange>) -> Self {
        self.state().files.insert(number, files);
        self
    }

    /// Seed branches that exist upstream.
    pub fn with_remote_branches<I, S>(self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state()
            .remote_branches
            .extend(branches.into_iter().map(Into::into));
        self
    }

    /// Set the authenticated user's handle.
    pub fn with_user(self, user: &str) -> Self {
        self.state().user = user.to_string();
        self
    }

    /// Reject native approvals (e.g. "already approved").
    pub fn reject_approvals(self, reason: &str) -> Self {
        self.state().approval_rejection = Some(reason.to_string());
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use gitpr::forge::mock::{MockForge, FailOn};
    /// use gitpr::forge::{ForgeError, ForgeProvider};
    ///
    /// let forge = MockForge::new(ForgeProvider::GitLab)
    ///     .fail_on(FailOn::Create(ForgeError::Transient("timeout".into())));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.state().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Comments posted so far, as `(number, body)`.
    pub fn comments(&self) -> Vec<(u64, String)> {
        self.state().comments.clone()
    }

    /// Branches currently present upstream.
    pub fn remote_branches(&self) -> BTreeSet<String> {
        self.state().remote_branches.clone()
    }

    /// Get a change request by number (for test verification).
    pub fn change_request(&self, number: u64) -> Option<ChangeRequest> {
        self.state().change_requests.get(&number).cloned()
    }

    fn state(&self) -> MutexGuard<'_, MockForgeInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an operation and return the configured failure for it, if any.
    fn begin(&self, op: MockOperation) -> Result<(), ForgeError> {
        let mut inner = self.state();
        let failure = match (&inner.fail_on, &op) {
            (Some(FailOn::CurrentUser(e)), MockOperation::CurrentUser)
            | (Some(FailOn::Create(e)), MockOperation::Create { .. })
            | (Some(FailOn::Get(e)), MockOperation::Get { .. })
            | (Some(FailOn::ListFiles(e)), MockOperation::ListFiles { .. })
            | (Some(FailOn::Edit(e)), MockOperation::Edit { .. })
            | (Some(FailOn::Comment(e)), MockOperation::Comment { .. })
            | (Some(FailOn::Review(e)), MockOperation::Review { .. })
            | (Some(FailOn::ListMerged(e)), MockOperation::ListMerged)
            | (Some(FailOn::DeleteBranch(e)), MockOperation::DeleteBranch { .. }) => {
                Some(e.clone())
            }
            _ => None,
        };
        inner.operations.push(op);
        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl Forge for MockForge {
    fn provider(&self) -> ForgeProvider {
        self.provider
    }

    async fn current_user(&self) -> Result<String, ForgeError> {
        self.begin(MockOperation::CurrentUser)?;
        Ok(self.state().user.clone())
    }

    async fn create_change_request(
        &self,
        request: CreateChangeRequest,
    ) -> Result<ChangeRequest, ForgeError> {
        self.begin(MockOperation::Create {
            source_branch: request.source_branch.clone(),
            target_branch: request.target_branch.clone(),
            title: request.title.clone(),
            draft: request.draft,
        })?;

        if request.source_branch == request.target_branch {
            return Err(ForgeError::CreateFailed(
                "source and target branch are the same".into(),
            ));
        }

        let mut inner = self.state();
        let number = inner.next_number;
        inner.next_number += 1;

        let cr = ChangeRequest {
            number,
            title: request.title,
            body: request.body,
            url: format!("https://mock.forge/acme/widgets/{}", number),
            state: ChangeState::Open,
            author: inner.user.clone(),
            source_branch: request.source_branch,
            target_branch: request.target_branch,
            draft: request.draft,
        };
        inner.change_requests.insert(number, cr.clone());
        Ok(cr)
    }

    async fn get_change_request(&self, number: u64) -> Result<ChangeRequest, ForgeError> {
        self.begin(MockOperation::Get { number })?;
        self.change_request(number)
            .ok_or(ForgeError::ChangeRequestNotFound { number })
    }

    async fn list_file_changes(&self, number: u64) -> Result<Vec<FileChange>, ForgeError> {
        self.begin(MockOperation::ListFiles { number })?;
        let inner = self.state();
        if !inner.change_requests.contains_key(&number) {
            return Err(ForgeError::ChangeRequestNotFound { number });
        }
        Ok(inner.files.get(&number).cloned().unwrap_or_default())
    }

    async fn edit_change_request(
        &self,
        request: EditChangeRequest,
    ) -> Result<ChangeRequest, ForgeError> {
        self.begin(MockOperation::Edit {
            number: request.number,
            title: request.title().map(String::from),
            body: request.body().map(String::from),
        })?;

        let mut inner = self.state();
        let cr = inner
            .change_requests
            .get_mut(&request.number)
            .ok_or(ForgeError::ChangeRequestNotFound {
                number: request.number,
            })?;

        if let Some(title) = request.title() {
            cr.title = title.to_string();
        }
        if let Some(body) = request.body() {
            cr.body = body.to_string();
        }
        Ok(cr.clone())
    }

    async fn add_comment(&self, number: u64, body: &str) -> Result<(), ForgeError> {
        self.begin(MockOperation::Comment {
            number,
            body: body.to_string(),
        })?;

        let mut inner = self.state();
        if !inner.change_requests.contains_key(&number) {
            return Err(ForgeError::ChangeRequestNotFound { number });
        }
        inner.comments.push((number, body.to_string()));
        Ok(())
    }

    async fn submit_review(
        &self,
        number: u64,
        decision: ReviewDecision,
        body: &str,
    ) -> Result<ReviewOutcome, ForgeError> {
        self.begin(MockOperation::Review {
            number,
            decision,
            body: body.to_string(),
        })?;

        let mut inner = self.state();
        if !inner.change_requests.contains_key(&number) {
            return Err(ForgeError::ChangeRequestNotFound { number });
        }

        match (&inner.approval_rejection, decision) {
            (Some(reason), ReviewDecision::Approve) => {
                let reason = reason.clone();
                inner.comments.push((number, body.to_string()));
                Ok(ReviewOutcome::ApprovalFallback { reason })
            }
            _ => Ok(ReviewOutcome::Submitted),
        }
    }

    async fn list_merged_source_branches(&self) -> Result<BTreeSet<String>, ForgeError> {
        self.begin(MockOperation::ListMerged)?;
        Ok(self
            .state()
            .change_requests
            .values()
            .filter(|cr| cr.is_merged())
            .map(|cr| cr.source_branch.clone())
            .collect())
    }

    async fn delete_remote_branch(&self, branch: &str) -> Result<(), ForgeError> {
        self.begin(MockOperation::DeleteBranch {
            branch: branch.to_string(),
        })?;

        if self.state().remote_branches.remove(branch) {
            Ok(())
        } else {
            Err(ForgeError::BranchNotFound {
                branch: branch.to_string(),
            })
        }
    }
}
