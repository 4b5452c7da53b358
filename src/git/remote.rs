//! git::remote
//!
//! Remote URL parsing into a [`RepositoryContext`].
//!
//! # Accepted Forms
//!
//! - scp-style: `git@host:owner/name.git`
//! - URL-style: `https://host/owner/name.git`, `http://…`, `ssh://git@host:22/owner/name.git`
//!
//! The `.git` suffix and a trailing `/` are optional. Every path segment
//! before the last one belongs to the owner, which keeps GitLab subgroups
//! (`group/subgroup/project`) intact.

use std::fmt;

/// Which repository an invocation is about.
///
/// Derived from the working copy once per invocation; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    /// Remote host, without user or port (e.g. `github.com`).
    pub host: String,
    /// Owner path (user, organization, or GitLab group path).
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// The remote URL the context was parsed from.
    pub remote_url: String,
}

impl RepositoryContext {
    /// `owner/name`, the form both providers use to address a repository.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a remote URL.
///
/// Returns `None` if the URL has no host or fewer than two path segments.
///
/// # Example
///
/// ```
/// use gitpr::git::parse_remote_url;
///
/// let ssh = parse_remote_url("git@github.com:acme/widgets.git").unwrap();
/// let https = parse_remote_url("https://github.com/acme/widgets.git").unwrap();
/// assert_eq!((ssh.owner.as_str(), ssh.name.as_str()), ("acme", "widgets"));
/// assert_eq!((https.owner.as_str(), https.name.as_str()), ("acme", "widgets"));
/// ```
pub fn parse_remote_url(url: &str) -> Option<RepositoryContext> {
    let trimmed = url.trim();
    let (authority, path) = split_remote(trimmed)?;

    let host = strip_user_and_port(authority);
    if host.is_empty() {
        return None;
    }

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    let (name, owner) = segments.split_last()?;

    Some(RepositoryContext {
        host: host.to_string(),
        owner: owner.join("/"),
        name: name.to_string(),
        remote_url: trimmed.to_string(),
    })
}

/// Split a remote into `(authority, path)`.
fn split_remote(url: &str) -> Option<(&str, &str)> {
    if let Some((_, rest)) = url.split_once("://") {
        return rest.split_once('/');
    }

    // scp-style `user@host:path`; a bare local path has no ':' before any '/'
    let (authority, path) = url.split_once(':')?;
    if authority.contains('/') {
        return None;
    }
    Some((authority, path))
}

fn strip_user_and_port(authority: &str) -> &str {
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    host.split_once(':').map_or(host, |(h, _)| h)
}
