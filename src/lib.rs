//! gitpr - One CLI for GitHub pull requests and GitLab merge requests
//!
//! gitpr detects the hosting provider from the repository's remote and
//! exposes a single vocabulary (create, view, diff, edit, comment, review,
//! cleanup) over both providers' REST APIs.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, runs one forge operation)
//! - [`core`] - Storage paths, persisted configuration, atomic file writes
//! - [`git`] - Repository context resolution and local branch cleanup
//! - [`forge`] - Provider-neutral `Forge` trait with GitHub and GitLab clients
//! - [`secrets`] - Token encryption at rest
//! - [`notify`] - Best-effort webhook notification
//! - [`ui`] - Output formatting
//!
//! # Invariants
//!
//! 1. Provider-specific payloads never leave [`forge`]; commands see only
//!    normalized change requests
//! 2. Tokens are stored encrypted and are never printed or logged
//! 3. A change request is merged iff its state is `merged`

pub mod cli;
pub mod core;
pub mod forge;
pub mod git;
pub mod notify;
pub mod secrets;
pub mod ui;
