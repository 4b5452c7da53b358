//! git
//!
//! Local repository access.
//!
//! # Architecture
//!
//! This module is the **only doorway** to the working copy. No other module
//! should import `git2`. The remote is read once per invocation and turned
//! into a [`RepositoryContext`]; nothing about the repository is persisted.
//!
//! # Example
//!
//! ```no_run
//! use gitpr::git::resolve_context;
//! use std::path::Path;
//!
//! let ctx = resolve_context(Path::new("."))?;
//! println!("{} on {}", ctx, ctx.host);
//! # Ok::<(), gitpr::git::GitError>(())
//! ```

mod interface;
mod remote;

use std::path::Path;

pub use interface::{Git, GitError};
pub use remote::{parse_remote_url, RepositoryContext};

/// Resolve the repository context for a working directory.
///
/// Walks up from `path` to the nearest repository, reads its default remote,
/// and parses `owner/name` from the URL. Every failure is a hard stop for the
/// caller: no repository, no remote, or an unparseable URL.
pub fn resolve_context(path: &Path) -> Result<RepositoryContext, GitError> {
    let git = Git::open(path)?;
    let ctx = git.context()?;
    tracing::debug!(host = %ctx.host, repo = %ctx, "resolved repository context");
    Ok(ctx)
}
