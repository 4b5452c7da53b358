//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the **single doorway** to the local repository. It only
//! reads remotes and, on explicit request, deletes a local branch.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::NoRemote`]: Repository has no remotes
//! - [`GitError::UnrecognizedRemote`]: Remote URL has no `owner/name`
//! - [`GitError::BranchNotFound`] / [`GitError::BranchCheckedOut`] /
//!   [`GitError::BranchNotMerged`]: local branch deletion refused

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::remote::{parse_remote_url, RepositoryContext};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// The repository has no remote configured.
    #[error("no git remote configured (add one with `git remote add origin <url>`)")]
    NoRemote,

    /// The remote URL does not contain an `owner/name` path.
    #[error("cannot derive owner/name from remote URL '{url}'")]
    UnrecognizedRemote {
        /// The URL that failed to parse
        url: String,
    },

    /// The local branch does not exist.
    #[error("local branch not found: {name}")]
    BranchNotFound {
        /// Branch name
        name: String,
    },

    /// Refusing to delete the checked-out branch.
    #[error("cannot delete '{name}': it is the current branch")]
    BranchCheckedOut {
        /// Branch name
        name: String,
    },

    /// Refusing to delete a branch that is not merged upstream.
    #[error("branch '{name}' is not merged; pass --force to delete it anyway")]
    BranchNotMerged {
        /// Branch name
        name: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// Error message from git2
        message: String,
    },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Handle on a discovered repository.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git").field("path", &self.repo.path()).finish()
    }
}

impl Git {
    /// Open the repository containing `path`.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the working copy.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Get the URL for a remote.
    ///
    /// Returns `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the default remote name.
    ///
    /// Prefers "origin", otherwise the first remote; `None` if there are none.
    pub fn default_remote(&self) -> Result<Option<String>, GitError> {
        let remotes = self.repo.remotes()?;

        if remotes.iter().flatten().any(|name| name == "origin") {
            return Ok(Some("origin".to_string()));
        }

        Ok(remotes.iter().flatten().next().map(String::from))
    }

    /// Resolve the repository context from the default remote.
    pub fn context(&self) -> Result<RepositoryContext, GitError> {
        let remote = self.default_remote()?.ok_or(GitError::NoRemote)?;
        let url = self.remote_url(&remote)?.ok_or(GitError::NoRemote)?;

        parse_remote_url(&url).ok_or(GitError::UnrecognizedRemote { url })
    }

    /// Check whether a local branch exists.
    pub fn local_branch_exists(&self, name: &str) -> bool {
        self.repo.find_branch(name, git2::BranchType::Local).is_ok()
    }

    /// Delete a local branch.
    ///
    /// `merged` is the upstream merge status known to the caller. An unmerged
    /// branch is only deleted with `force`.
    pub fn delete_local_branch(&self, name: &str, merged: bool, force: bool) -> Result<(), GitError> {
        let mut branch = match self.repo.find_branch(name, git2::BranchType::Local) {
            Ok(branch) => branch,
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                return Err(GitError::BranchNotFound {
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if branch.is_head() {
            return Err(GitError::BranchCheckedOut {
                name: name.to_string(),
            });
        }

        if !merged && !force {
            return Err(GitError::BranchNotMerged {
                name: name.to_string(),
            });
        }

        branch.delete()?;
        tracing::debug!(branch = name, "deleted local branch");
        Ok(())
    }
}
