//! cli::commands::cleanup
//!
//! Check whether a branch has been merged upstream and optionally delete it.
//!
//! # Design
//!
//! - The merge check is always performed and reported
//! - Nothing is deleted without an explicit flag
//! - Each deletion step is attempted independently; a failed remote
//!   deletion does not prevent the local one
//! - An unmerged local branch is only deleted with `--force`
//!
//! # Example
//!
//! ```bash
//! gitpr cleanup feature                    # report only
//! gitpr cleanup feature --remote --local   # delete both copies
//! ```

use anyhow::{bail, Result};

use super::{block_on, open_session, working_dir};
use crate::cli::Context;
use crate::forge::{Forge, ForgeError};
use crate::git::Git;
use crate::ui::output::{self, Verbosity};

/// Which deletions to perform.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupOptions {
    pub delete_remote: bool,
    pub delete_local: bool,
    /// Delete the local branch even when it is not merged upstream
    pub force: bool,
}

/// Result of one deletion step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Not requested
    Skipped,
    /// The branch does not exist locally
    Absent,
    Deleted,
    Failed(String),
}

/// What `cleanup` found and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub branch: String,
    /// Whether some merged change request had this branch as its source
    pub merged: bool,
    pub remote: StepOutcome,
    pub local: StepOutcome,
}

impl CleanupReport {
    /// True if no requested step failed.
    pub fn is_success(&self) -> bool {
        !matches!(self.remote, StepOutcome::Failed(_))
            && !matches!(self.local, StepOutcome::Failed(_))
    }

    /// Human-readable lines describing the report.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.merged {
            lines.push(format!("✔ Branch '{}' is merged upstream.", self.branch));
        } else {
            lines.push(format!("⚠ Branch '{}' is NOT merged upstream.", self.branch));
        }

        match &self.remote {
            StepOutcome::Deleted => lines.push("✔ Remote branch deleted.".to_string()),
            StepOutcome::Failed(e) => lines.push(format!("✘ Remote branch not deleted: {}", e)),
            StepOutcome::Skipped | StepOutcome::Absent => {}
        }

        match &self.local {
            StepOutcome::Deleted => lines.push("✔ Local branch deleted.".to_string()),
            StepOutcome::Absent => lines.push("No local branch to delete.".to_string()),
            StepOutcome::Failed(e) => lines.push(format!("✘ Local branch not deleted: {}", e)),
            StepOutcome::Skipped => {}
        }

        lines
    }
}

/// Run the cleanup command.
pub fn cleanup(ctx: &Context, branch: &str, options: CleanupOptions) -> Result<()> {
    let branch = branch.trim();
    if branch.is_empty() {
        bail!("Branch name cannot be empty.");
    }

    block_on(cleanup_async(ctx, branch, options))
}

async fn cleanup_async(ctx: &Context, branch: &str, options: CleanupOptions) -> Result<()> {
    let session = open_session(ctx).await?;
    let git = Git::open(&working_dir(ctx)?)?;

    let report =
        cleanup_branch(session.connection.forge.as_ref(), &git, branch, options).await?;

    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    for line in report.lines() {
        output::print(line, verbosity);
    }

    if !report.is_success() {
        bail!("cleanup of '{}' did not complete", branch);
    }
    Ok(())
}

/// Determine the merge status of `branch` and perform the requested deletions.
///
/// # Errors
///
/// Only a failure to determine the merge status is an error; deletion
/// failures are recorded in the report.
pub async fn cleanup_branch(
    forge: &dyn Forge,
    git: &Git,
    branch: &str,
    options: CleanupOptions,
) -> Result<CleanupReport, ForgeError> {
    let merged = forge.list_merged_source_branches().await?.contains(branch);
    tracing::debug!(branch, merged, "merge status");

    let remote = if options.delete_remote {
        match forge.delete_remote_branch(branch).await {
            Ok(()) => StepOutcome::Deleted,
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    } else {
        StepOutcome::Skipped
    };

    let local = if !options.delete_local {
        StepOutcome::Skipped
    } else if !git.local_branch_exists(branch) {
        StepOutcome::Absent
    } else {
        match git.delete_local_branch(branch, merged, options.force) {
            Ok(()) => StepOutcome::Deleted,
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    };

    Ok(CleanupReport {
        branch: branch.to_string(),
        merged,
        remote,
        local,
    })
}
