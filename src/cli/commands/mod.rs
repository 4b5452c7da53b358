//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Opens a [`Session`] (repository context + authenticated forge)
//! 3. Performs one forge operation and formats the result
//!
//! The forge-facing part of each handler takes `&dyn Forge` so it can be
//! exercised against [`crate::forge::mock::MockForge`].
//!
//! # Async Commands
//!
//! Forge commands involve network I/O. Each sync handler builds a tokio
//! runtime and blocks on its async body.

mod cleanup;
mod comment;
mod completion;
mod create;
mod diff;
mod edit;
mod login;
mod review;
mod view;
mod whoami;

// Re-export command functions for testing and direct invocation
pub use cleanup::{cleanup, cleanup_branch, CleanupOptions, CleanupReport, StepOutcome};
pub use comment::comment;
pub use completion::completion;
pub use create::create;
pub use diff::diff;
pub use edit::edit;
pub use login::{login, store_login};
pub use review::review;
pub use view::view;
pub use whoami::whoami;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::cli::Context;
use crate::core::config::{ConfigFile, ForgeConfig};
use crate::core::paths::AppPaths;
use crate::forge::{self, Connection};
use crate::git::{self, RepositoryContext};
use crate::secrets::SecretStore;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Login {
            provider,
            host,
            token,
            webhook,
        } => login::login(
            ctx,
            &provider,
            host.as_deref(),
            token.as_deref(),
            webhook.as_deref(),
        ),
        Command::Whoami => whoami::whoami(ctx),
        Command::Create {
            from,
            to,
            title,
            body,
            draft,
        } => create::create(ctx, &from, &to, &title, &body, draft),
        Command::View { number } => view::view(ctx, number),
        Command::Diff { number, patch } => diff::diff(ctx, number, patch),
        Command::Edit {
            number,
            title,
            body,
        } => edit::edit(ctx, number, title.as_deref(), body.as_deref()),
        Command::Comment { number, message } => comment::comment(ctx, number, &message),
        Command::Review {
            number,
            action,
            message,
        } => review::review(ctx, number, action.into(), &message),
        Command::Cleanup {
            branch,
            remote,
            local,
            force,
        } => cleanup::cleanup(
            ctx,
            &branch,
            CleanupOptions {
                delete_remote: remote,
                delete_local: local,
                force,
            },
        ),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Directory the command operates in.
pub(crate) fn working_dir(ctx: &Context) -> Result<PathBuf> {
    match &ctx.cwd {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// A resolved repository with an authenticated forge.
pub(crate) struct Session {
    pub repo: RepositoryContext,
    pub config: ForgeConfig,
    pub connection: Connection,
}

/// Resolve the repository, load stored settings, and authenticate.
pub(crate) async fn open_session(ctx: &Context) -> Result<Session> {
    let cwd = working_dir(ctx)?;
    let repo = git::resolve_context(&cwd)?;

    let paths = AppPaths::resolve()?;
    let config = ConfigFile::from_paths(&paths).load_or_default()?;
    let secrets = SecretStore::from_paths(&paths);

    let connection = forge::connect(&repo, &config, &secrets).await?;

    Ok(Session {
        repo,
        config,
        connection,
    })
}

/// Run an async command body to completion.
pub(crate) fn block_on<F>(fut: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fut)
}
