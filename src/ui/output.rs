//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Rendering
//! is separated from printing so that command output can be asserted on in
//! tests without capturing stdout.

use std::fmt::Display;

use crate::forge::{ChangeRequest, FileChange, ForgeError};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("✔ {}", message);
    }
}

/// Render a change request for `view`.
pub fn format_change_request(cr: &ChangeRequest) -> String {
    let mut out = String::new();
    let draft = if cr.draft { " [draft]" } else { "" };
    out.push_str(&format!("#{} {}{}\n", cr.number, cr.title, draft));
    out.push_str(&format!("State:  {}\n", cr.state));
    out.push_str(&format!("Author: {}\n", cr.author));
    out.push_str(&format!(
        "Branch: {} -> {}\n",
        cr.source_branch, cr.target_branch
    ));
    out.push_str(&format!("URL:    {}", cr.url));

    let body = cr.body.trim();
    if !body.is_empty() {
        out.push_str("\n\n");
        out.push_str(body);
    }
    out
}

/// Render the per-file summary for `diff`, with totals.
pub fn format_file_changes(files: &[FileChange]) -> String {
    if files.is_empty() {
        return "No changed files.".to_string();
    }

    let width = files.iter().map(|f| f.path.len()).max().unwrap_or(0);
    let mut lines: Vec<String> = files
        .iter()
        .map(|f| {
            format!(
                "{:<width$}  +{} -{}  ({})",
                f.path,
                f.lines_added,
                f.lines_removed,
                f.kind,
                width = width
            )
        })
        .collect();

    let added: u64 = files.iter().map(|f| f.lines_added).sum();
    let removed: u64 = files.iter().map(|f| f.lines_removed).sum();
    let noun = if files.len() == 1 { "file" } else { "files" };
    lines.push(format!(
        "{} {} changed, +{} -{}",
        files.len(),
        noun,
        added,
        removed
    ));
    lines.join("\n")
}

/// Render the raw patches for `diff --patch`.
pub fn format_patches(files: &[FileChange]) -> String {
    files
        .iter()
        .map(|f| match &f.patch {
            Some(patch) => format!("--- {}\n{}", f.path, patch.trim_end()),
            None => format!("--- {}\n(no diff available)", f.path),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Remediation hint for a forge failure, if there is a useful one.
pub fn hint_for(err: &ForgeError) -> Option<&'static str> {
    match err {
        ForgeError::AuthFailed(_) | ForgeError::NotConfigured { .. } => {
            Some("run `gitpr login --provider <github|gitlab>` to store a valid token")
        }
        ForgeError::PermissionDenied(_) => {
            Some("check that the token has API scope and access to this repository")
        }
        ForgeError::ChangeRequestNotFound { .. } => {
            Some("check the number; it must belong to this repository")
        }
        ForgeError::BranchNotFound { .. } => Some("check the branch name on the remote"),
        ForgeError::NotFound(_) => {
            Some("check the repository remote and that the token can see the project")
        }
        e if e.is_retryable() => Some("the provider could not be reached; try again"),
        _ => None,
    }
}
