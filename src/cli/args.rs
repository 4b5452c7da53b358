//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--interactive` / `--no-interactive`: Control prompts
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::forge::ReviewDecision;

/// gitpr - One CLI for GitHub pull requests and GitLab merge requests
#[derive(Parser, Debug)]
#[command(name = "gitpr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gitpr was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable interactive prompts
    #[arg(long = "interactive", global = true, conflicts_with = "no_interactive")]
    pub interactive_flag: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Determine if interactive mode is enabled.
    ///
    /// Returns true if:
    /// - `--interactive` was explicitly set, OR
    /// - Neither `--no-interactive` nor `--quiet` was set AND stdin is a TTY
    pub fn interactive(&self, stdin_is_tty: bool) -> bool {
        if self.interactive_flag {
            true
        } else if self.no_interactive || self.quiet {
            false
        } else {
            stdin_is_tty
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a provider token (encrypted) and optional notification webhook
    #[command(
        name = "login",
        long_about = "Store a provider token, encrypted at rest, for later commands.\n\n\
            The token is read from a hidden prompt unless --token is given. It is \
            never printed. Logging in to one provider keeps the stored settings of \
            the other.",
        after_help = "\
EXAMPLES:
    # github.com (prompts for the token)
    gitpr login --provider github

    # GitHub Enterprise
    gitpr login --provider github --host github.example.com

    # Self-hosted GitLab, plus a Slack-compatible webhook
    gitpr login --provider gitlab --host gitlab.example.com --webhook https://hooks.slack.com/..."
    )]
    Login {
        /// Provider to store the token for (github or gitlab)
        #[arg(long)]
        provider: String,

        /// Self-hosted domain (GitHub Enterprise or GitLab instance)
        #[arg(long)]
        host: Option<String>,

        /// Token value (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Webhook to notify when a change request is created
        #[arg(long)]
        webhook: Option<String>,
    },

    /// Show the authenticated user for this repository's provider
    Whoami,

    /// Open a pull/merge request
    #[command(
        name = "create",
        after_help = "\
EXAMPLES:
    gitpr create --from feature --to main --title \"Add feature\"
    gitpr create --from wip --to main --title \"Spike\" --body \"Not ready\" --draft"
    )]
    Create {
        /// Source branch (must exist on the remote)
        #[arg(long = "from", short = 'f')]
        from: String,

        /// Target branch
        #[arg(long = "to", short = 't')]
        to: String,

        /// Title
        #[arg(long)]
        title: String,

        /// Description
        #[arg(long, default_value = "")]
        body: String,

        /// Open as a draft
        #[arg(long)]
        draft: bool,
    },

    /// Show a pull/merge request
    View {
        /// Change request number
        number: u64,
    },

    /// List the files a pull/merge request changes
    Diff {
        /// Change request number
        number: u64,

        /// Also print each file's patch
        #[arg(long, short = 'p')]
        patch: bool,
    },

    /// Change the title and/or description
    Edit {
        /// Change request number
        number: u64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        body: Option<String>,
    },

    /// Add a comment
    Comment {
        /// Change request number
        number: u64,

        /// Comment text
        #[arg(long, short = 'm')]
        message: String,
    },

    /// Approve, request changes, or comment as a review
    #[command(
        name = "review",
        long_about = "Submit a review.\n\n\
            On GitLab, approvals are recorded natively when permitted and the message \
            is always posted as a note. If the provider refuses the approval (for \
            example, approving your own change request), the message is still posted \
            as a comment.",
        after_help = "\
EXAMPLES:
    gitpr review 42 --action approve --message lgtm
    gitpr review 42 --action request-changes --message \"Please add tests\""
    )]
    Review {
        /// Change request number
        number: u64,

        /// Review action
        #[arg(long, value_enum)]
        action: ReviewAction,

        /// Review message
        #[arg(long, short = 'm', default_value = "")]
        message: String,
    },

    /// Check whether a branch is merged and optionally delete it
    #[command(
        name = "cleanup",
        long_about = "Report whether a branch was the source of a merged change request.\n\n\
            Nothing is deleted unless asked for: --remote deletes the branch on the \
            provider, --local deletes the local branch. Deleting an unmerged local \
            branch also requires --force.",
        after_help = "\
EXAMPLES:
    # Just check
    gitpr cleanup feature

    # Delete both copies of a merged branch
    gitpr cleanup feature --remote --local"
    )]
    Cleanup {
        /// Branch name
        branch: String,

        /// Delete the remote branch
        #[arg(long)]
        remote: bool,

        /// Delete the local branch
        #[arg(long)]
        local: bool,

        /// Delete the local branch even if it is not merged
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    gitpr completion bash > ~/.local/share/bash-completion/completions/gitpr

    # Zsh
    gitpr completion zsh > ~/.zfunc/_gitpr

    # Fish
    gitpr completion fish > ~/.config/fish/completions/gitpr.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Review action.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    RequestChanges,
    Comment,
}

impl From<ReviewAction> for ReviewDecision {
    fn from(action: ReviewAction) -> Self {
        match action {
            ReviewAction::Approve => ReviewDecision::Approve,
            ReviewAction::RequestChanges => ReviewDecision::RequestChanges,
            ReviewAction::Comment => ReviewDecision::Comment,
        }
    }
}

/// Shell type for completions.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
