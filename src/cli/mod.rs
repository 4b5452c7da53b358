//! cli
//!
//! Command-line interface layer for gitpr.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Report failures with a remediation hint where one applies
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`commands`], which resolve the repository, open an authenticated forge
//! session, and call a single [`crate::forge::Forge`] operation.

pub mod args;
pub mod commands;

pub use args::{Cli, ReviewAction, Shell};

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;

use crate::forge::ForgeError;
use crate::ui::output;

/// Execution context shared by all commands.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Directory to run in (defaults to the process working directory)
    pub cwd: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
    /// Whether prompts may be shown
    pub interactive: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        interactive: cli.interactive(std::io::stdin().is_terminal()),
    };

    commands::dispatch(cli.command, &ctx)
}

/// Print a failure and, for forge errors, what to do about it.
pub fn report_error(err: &anyhow::Error) {
    output::error(format!("{:#}", err));
    if let Some(hint) = err.downcast_ref::<ForgeError>().and_then(output::hint_for) {
        eprintln!("hint: {}", hint);
    }
}
