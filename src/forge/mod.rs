//! forge
//!
//! Abstraction over code-hosting services (GitHub, GitLab).
//!
//! # Architecture
//!
//! The `Forge` trait defines the interface commands use to talk to the
//! remote. Commands go through [`connect`] (or [`create_forge`]) rather than
//! importing specific forge implementations directly, and only ever see the
//! normalized [`ChangeRequest`] / [`FileChange`] values.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait, request/response types, and errors
//! - [`github`]: GitHub REST implementation (pull requests)
//! - [`gitlab`]: GitLab REST implementation (merge requests)
//! - [`mock`]: Mock implementation for deterministic testing
//! - `normalize`: Provider JSON → normalized records
//! - `factory`: Provider detection and forge creation
//!
//! # Example
//!
//! ```no_run
//! use gitpr::forge::{CreateChangeRequest, Forge, GitHubForge};
//!
//! # async fn example() -> Result<(), gitpr::forge::ForgeError> {
//! let forge = GitHubForge::new("ghp_token", "acme", "widgets")?;
//!
//! let cr = forge.create_change_request(CreateChangeRequest {
//!     title: "Add feature".to_string(),
//!     body: String::new(),
//!     source_branch: "feature".to_string(),
//!     target_branch: "main".to_string(),
//!     draft: false,
//! }).await?;
//!
//! println!("Created #{}: {}", cr.number, cr.url);
//! # Ok(())
//! # }
//! ```

mod factory;
pub mod github;
pub mod gitlab;
mod http;
pub mod mock;
mod normalize;
mod traits;

pub use factory::{connect, create_forge, detect_provider, Connection, ForgeProvider};
pub use github::GitHubForge;
pub use gitlab::GitLabForge;
pub use normalize::{count_diff_lines, normalize, normalize_all, normalize_files};
pub use traits::*;
