//! forge::normalize
//!
//! Pure mapping from provider JSON to the canonical entities.
//!
//! # Field Mapping
//!
//! | Canonical       | GitHub pull request  | GitLab merge request          |
//! |-----------------|----------------------|-------------------------------|
//! | `number`        | `number`             | `iid`                         |
//! | `body`          | `body` (null → "")   | `description` (null → "")     |
//! | `url`           | `html_url`           | `web_url`                     |
//! | `author`        | `user.login`         | `author.username`             |
//! | `source_branch` | `head.ref`           | `source_branch`               |
//! | `target_branch` | `base.ref`           | `target_branch`               |
//! | `draft`         | `draft`              | `draft` / `work_in_progress` / title prefix |
//!
//! # State Derivation
//!
//! GitHub reports `open`/`closed` plus a separate merge flag: the state is
//! `merged` when `merged` is true, `merged_at` is set, or the state string is
//! `merged`. GitLab reports the state string only (`opened`, `closed`,
//! `merged`, `locked`). Unknown state strings are a normalization error.
//!
//! # Diff Line Counts
//!
//! GitLab only exposes the unified diff, so its added/removed counts are
//! derived by [`count_diff_lines`]. This is an approximation of what the
//! provider would report: lines are classified by their first character
//! only, and `+++`/`---` file headers before the first hunk are skipped.

use serde::Deserialize;
use serde_json::Value;

use super::factory::ForgeProvider;
use super::traits::{ChangeKind, ChangeRequest, ChangeState, FileChange, ForgeError};

/// Author handle used when the provider reports no user (deleted accounts).
const GHOST_AUTHOR: &str = "ghost";

/// Title prefixes GitLab treats as draft markers.
const GITLAB_DRAFT_PREFIXES: &[&str] = &["Draft:", "[Draft]", "(Draft)", "WIP:", "[WIP]"];

/// Normalize one change request.
///
/// # Errors
///
/// `ForgeError::Normalization` if a required field is missing or has the
/// wrong type, or the state string is unknown.
pub fn normalize(provider: ForgeProvider, raw: Value) -> Result<ChangeRequest, ForgeError> {
    match provider {
        ForgeProvider::GitHub => decode::<GitHubPullRequest>(raw)?.try_into(),
        ForgeProvider::GitLab => decode::<GitLabMergeRequest>(raw)?.try_into(),
    }
}

/// Normalize a list of change requests, preserving order.
pub fn normalize_all(provider: ForgeProvider, raw: Value) -> Result<Vec<ChangeRequest>, ForgeError> {
    match raw {
        Value::Array(items) => items
            .into_iter()
            .map(|item| normalize(provider, item))
            .collect(),
        other => Err(ForgeError::Normalization(format!(
            "expected a list of change requests, got {}",
            json_kind(&other)
        ))),
    }
}

/// Normalize a file listing, preserving provider order.
///
/// GitHub: the array returned by `pulls/{n}/files` (one page).
/// GitLab: the object returned by `merge_requests/{iid}/changes`.
pub fn normalize_files(provider: ForgeProvider, raw: Value) -> Result<Vec<FileChange>, ForgeError> {
    match provider {
        ForgeProvider::GitHub => Ok(decode::<Vec<GitHubFile>>(raw)?
            .into_iter()
            .map(FileChange::from)
            .collect()),
        ForgeProvider::GitLab => Ok(decode::<GitLabChanges>(raw)?
            .changes
            .into_iter()
            .map(FileChange::from)
            .collect()),
    }
}

/// Count added and removed lines in a unified diff.
///
/// Returns `(added, removed)`. `+++`/`---` headers preceding the first `@@`
/// hunk of each file are not counted; inside a hunk every line starting with
/// `+` or `-` is.
///
/// # Example
///
/// ```
/// use gitpr::forge::count_diff_lines;
///
/// let patch = "--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n-old\n+new\n context\n";
/// assert_eq!(count_diff_lines(patch), (1, 1));
/// ```
pub fn count_diff_lines(patch: &str) -> (u64, u64) {
    let mut added = 0;
    let mut removed = 0;
    let mut in_hunk = false;

    for line in patch.lines() {
        if line.starts_with("@@") {
            in_hunk = true;
            continue;
        }
        if line.starts_with("diff --git") {
            in_hunk = false;
            continue;
        }
        if !in_hunk && (line.starts_with("+++") || line.starts_with("---")) {
            continue;
        }

        match line.as_bytes().first() {
            Some(b'+') => added += 1,
            Some(b'-') => removed += 1,
            _ => {}
        }
    }

    (added, removed)
}

fn decode<T: for<'de> Deserialize<'de>>(raw: Value) -> Result<T, ForgeError> {
    serde_json::from_value(raw).map_err(|e| ForgeError::Normalization(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// --------------------------------------------------------------------------
// GitHub
// --------------------------------------------------------------------------

#[derive(Deserialize)]
struct GitHubPullRequest {
    number: u64,
    html_url: String,
    state: String,
    title: String,
    body: Option<String>,
    user: Option<GitHubUser>,
    head: GitHubRef,
    base: GitHubRef,
    draft: Option<bool>,
    merged: Option<bool>,
    merged_at: Option<String>,
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

impl TryFrom<GitHubPullRequest> for ChangeRequest {
    type Error = ForgeError;

    fn try_from(pr: GitHubPullRequest) -> Result<Self, ForgeError> {
        let merged = pr.merged.unwrap_or(false) || pr.merged_at.is_some();

        let state = match (merged, pr.state.as_str()) {
            (true, _) | (_, "merged") => ChangeState::Merged,
            (false, "open") => ChangeState::Open,
            (false, "closed") => ChangeState::Closed,
            (false, other) => {
                return Err(ForgeError::Normalization(format!(
                    "unknown pull request state '{}' on #{}",
                    other, pr.number
                )))
            }
        };

        Ok(ChangeRequest {
            number: pr.number,
            title: pr.title,
            body: pr.body.unwrap_or_default(),
            url: pr.html_url,
            state,
            author: pr
                .user
                .map(|u| u.login)
                .unwrap_or_else(|| GHOST_AUTHOR.to_string()),
            source_branch: pr.head.ref_name,
            target_branch: pr.base.ref_name,
            draft: pr.draft.unwrap_or(false),
        })
    }
}

#[derive(Deserialize)]
struct GitHubFile {
    filename: String,
    status: String,
    additions: u64,
    deletions: u64,
    patch: Option<String>,
}

impl From<GitHubFile> for FileChange {
    fn from(file: GitHubFile) -> Self {
        let kind = match file.status.as_str() {
            "added" => ChangeKind::Added,
            "removed" => ChangeKind::Deleted,
            "renamed" => ChangeKind::Renamed,
            _ => ChangeKind::Modified,
        };

        FileChange {
            path: file.filename,
            kind,
            lines_added: file.additions,
            lines_removed: file.deletions,
            patch: file.patch.filter(|p| !p.is_empty()),
        }
    }
}

// --------------------------------------------------------------------------
// GitLab
// --------------------------------------------------------------------------

#[derive(Deserialize)]
struct GitLabMergeRequest {
    iid: u64,
    web_url: String,
    state: String,
    title: String,
    description: Option<String>,
    author: Option<GitLabUser>,
    source_branch: String,
    target_branch: String,
    draft: Option<bool>,
    work_in_progress: Option<bool>,
}

#[derive(Deserialize)]
struct GitLabUser {
    username: String,
}

impl TryFrom<GitLabMergeRequest> for ChangeRequest {
    type Error = ForgeError;

    fn try_from(mr: GitLabMergeRequest) -> Result<Self, ForgeError> {
        let state = match mr.state.as_str() {
            "opened" | "locked" => ChangeState::Open,
            "closed" => ChangeState::Closed,
            "merged" => ChangeState::Merged,
            other => {
                return Err(ForgeError::Normalization(format!(
                    "unknown merge request state '{}' on !{}",
                    other, mr.iid
                )))
            }
        };

        let draft = mr.draft.or(mr.work_in_progress).unwrap_or(false)
            || GITLAB_DRAFT_PREFIXES
                .iter()
                .any(|prefix| mr.title.starts_with(prefix));

        Ok(ChangeRequest {
            number: mr.iid,
            title: mr.title,
            body: mr.description.unwrap_or_default(),
            url: mr.web_url,
            state,
            author: mr
                .author
                .map(|u| u.username)
                .unwrap_or_else(|| GHOST_AUTHOR.to_string()),
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
            draft,
        })
    }
}

#[derive(Deserialize)]
struct GitLabChanges {
    changes: Vec<GitLabChange>,
}

#[derive(Deserialize)]
struct GitLabChange {
    new_path: String,
    #[serde(default)]
    diff: String,
    #[serde(default)]
    new_file: bool,
    #[serde(default)]
    renamed_file: bool,
    #[serde(default)]
    deleted_file: bool,
}

impl From<GitLabChange> for FileChange {
    fn from(change: GitLabChange) -> Self {
        let kind = if change.new_file {
            ChangeKind::Added
        } else if change.deleted_file {
            ChangeKind::Deleted
        } else if change.renamed_file {
            ChangeKind::Renamed
        } else {
            ChangeKind::Modified
        };

        let (lines_added, lines_removed) = count_diff_lines(&change.diff);

        FileChange {
            path: change.new_path,
            kind,
            lines_added,
            lines_removed,
            patch: Some(change.diff).filter(|d| !d.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn github_pr(state: &str, merged: Option<bool>) -> Value {
        json!({
            "number": 42,
            "html_url": "https://github.com/acme/widgets/pull/42",
            "state": state,
            "title": "Add feature",
            "body": "PR description",
            "user": {"login": "octocat"},
            "head": {"ref": "feature"},
            "base": {"ref": "main"},
            "draft": false,
            "merged": merged,
            "merged_at": null
        })
    }

    fn gitlab_mr(state: &str) -> Value {
        json!({
            "iid": 7,
            "web_url": "https://gitlab.com/acme/widgets/-/merge_requests/7",
            "state": state,
            "title": "Add feature",
            "description": "MR description",
            "author": {"username": "tanuki"},
            "source_branch": "feature",
            "target_branch": "main",
            "draft": false
        })
    }

    mod github {
        use super::*;

        #[test]
        fn open_pr() {
            let cr = normalize(ForgeProvider::GitHub, github_pr("open", Some(false))).unwrap();
            assert_eq!(cr.number, 42);
            assert_eq!(cr.url, "https://github.com/acme/widgets/pull/42");
            assert_eq!(cr.state, ChangeState::Open);
            assert_eq!(cr.author, "octocat");
            assert_eq!(cr.source_branch, "feature");
            assert_eq!(cr.target_branch, "main");
            assert_eq!(cr.body, "PR description");
            assert!(!cr.is_merged());
            assert!(!cr.draft);
        }

        #[test]
        fn merged_flag() {
            let cr = normalize(ForgeProvider::GitHub, github_pr("closed", Some(true))).unwrap();
            assert_eq!(cr.state, ChangeState::Merged);
            assert!(cr.is_merged());
        }

        #[test]
        fn merged_at_without_flag() {
            // list endpoints omit `merged` but carry `merged_at`
            let mut raw = github_pr("closed", None);
            raw["merged_at"] = json!("2024-05-01T12:00:00Z");
            let cr = normalize(ForgeProvider::GitHub, raw).unwrap();
            assert!(cr.is_merged());
        }

        #[test]
        fn closed_not_merged() {
            let cr = normalize(ForgeProvider::GitHub, github_pr("closed", Some(false))).unwrap();
            assert_eq!(cr.state, ChangeState::Closed);
        }

        #[test]
        fn null_body_is_empty() {
            let mut raw = github_pr("open", None);
            raw["body"] = Value::Null;
            assert_eq!(normalize(ForgeProvider::GitHub, raw).unwrap().body, "");

            let mut raw = github_pr("open", None);
            raw.as_object_mut().unwrap().remove("body");
            assert_eq!(normalize(ForgeProvider::GitHub, raw).unwrap().body, "");
        }

        #[test]
        fn deleted_user_is_ghost() {
            let mut raw = github_pr("open", None);
            raw["user"] = Value::Null;
            assert_eq!(normalize(ForgeProvider::GitHub, raw).unwrap().author, "ghost");
        }

        #[test]
        fn draft_flag() {
            let mut raw = github_pr("open", None);
            raw["draft"] = json!(true);
            assert!(normalize(ForgeProvider::GitHub, raw).unwrap().draft);
        }

        #[test]
        fn missing_required_field() {
            let mut raw = github_pr("open", None);
            raw.as_object_mut().unwrap().remove("head");
            assert!(matches!(
                normalize(ForgeProvider::GitHub, raw),
                Err(ForgeError::Normalization(_))
            ));
        }

        #[test]
        fn unknown_state() {
            assert!(matches!(
                normalize(ForgeProvider::GitHub, github_pr("pending", None)),
                Err(ForgeError::Normalization(_))
            ));
        }

        #[test]
        fn files() {
            let raw = json!([
                {"filename": "src/new.rs", "status": "added", "additions": 10, "deletions": 0, "patch": "@@ -0,0 +1 @@\n+x"},
                {"filename": "src/lib.rs", "status": "modified", "additions": 2, "deletions": 1, "patch": "@@"},
                {"filename": "old.txt", "status": "removed", "additions": 0, "deletions": 3},
                {"filename": "b.rs", "status": "renamed", "additions": 0, "deletions": 0, "previous_filename": "a.rs"},
                {"filename": "logo.png", "status": "changed", "additions": 0, "deletions": 0}
            ]);

            let files = normalize_files(ForgeProvider::GitHub, raw).unwrap();
            let kinds: Vec<ChangeKind> = files.iter().map(|f| f.kind).collect();
            assert_eq!(
                kinds,
                vec![
                    ChangeKind::Added,
                    ChangeKind::Modified,
                    ChangeKind::Deleted,
                    ChangeKind::Renamed,
                    ChangeKind::Modified
                ]
            );
            assert_eq!(files[0].lines_added, 10);
            assert_eq!(files[1].lines_removed, 1);
            assert!(files[2].patch.is_none());
            assert_eq!(files[4].path, "logo.png");
        }
    }

    mod gitlab {
        use super::*;

        #[test]
        fn opened_mr() {
            let cr = normalize(ForgeProvider::GitLab, gitlab_mr("opened")).unwrap();
            assert_eq!(cr.number, 7);
            assert_eq!(cr.state, ChangeState::Open);
            assert_eq!(cr.author, "tanuki");
            assert_eq!(cr.body, "MR description");
            assert_eq!(cr.url, "https://gitlab.com/acme/widgets/-/merge_requests/7");
        }

        #[test]
        fn merged_is_derived_from_state() {
            let cr = normalize(ForgeProvider::GitLab, gitlab_mr("merged")).unwrap();
            assert_eq!(cr.state, ChangeState::Merged);
            assert!(cr.is_merged());
        }

        #[test]
        fn closed_and_locked() {
            assert_eq!(
                normalize(ForgeProvider::GitLab, gitlab_mr("closed")).unwrap().state,
                ChangeState::Closed
            );
            assert_eq!(
                normalize(ForgeProvider::GitLab, gitlab_mr("locked")).unwrap().state,
                ChangeState::Open
            );
        }

        #[test]
        fn unknown_state() {
            assert!(matches!(
                normalize(ForgeProvider::GitLab, gitlab_mr("open")),
                Err(ForgeError::Normalization(_))
            ));
        }

        #[test]
        fn null_description_is_empty() {
            let mut raw = gitlab_mr("opened");
            raw["description"] = Value::Null;
            assert_eq!(normalize(ForgeProvider::GitLab, raw).unwrap().body, "");
        }

        #[test]
        fn draft_from_title_prefix() {
            let mut raw = gitlab_mr("opened");
            raw["title"] = json!("Draft: Add feature");
            raw.as_object_mut().unwrap().remove("draft");
            assert!(normalize(ForgeProvider::GitLab, raw).unwrap().draft);
        }

        #[test]
        fn draft_from_work_in_progress() {
            let mut raw = gitlab_mr("opened");
            raw.as_object_mut().unwrap().remove("draft");
            raw["work_in_progress"] = json!(true);
            assert!(normalize(ForgeProvider::GitLab, raw).unwrap().draft);
        }

        #[test]
        fn files_from_changes() {
            let raw = json!({
                "iid": 7,
                "changes": [
                    {"old_path": "a.rs", "new_path": "a.rs", "new_file": false, "renamed_file": false, "deleted_file": false,
                     "diff": "@@ -1,2 +1,3 @@\n-old\n+new\n+more\n ctx\n"},
                    {"old_path": "n.rs", "new_path": "n.rs", "new_file": true, "renamed_file": false, "deleted_file": false,
                     "diff": "@@ -0,0 +1 @@\n+x\n"},
                    {"old_path": "d.rs", "new_path": "d.rs", "new_file": false, "renamed_file": false, "deleted_file": true,
                     "diff": "@@ -1 +0,0 @@\n-x\n"},
                    {"old_path": "p.rs", "new_path": "q.rs", "new_file": false, "renamed_file": true, "deleted_file": false,
                     "diff": ""}
                ]
            });

            let files = normalize_files(ForgeProvider::GitLab, raw).unwrap();
            assert_eq!(files.len(), 4);
            assert_eq!(files[0].kind, ChangeKind::Modified);
            assert_eq!((files[0].lines_added, files[0].lines_removed), (2, 1));
            assert_eq!(files[1].kind, ChangeKind::Added);
            assert_eq!(files[2].kind, ChangeKind::Deleted);
            assert_eq!(files[3].kind, ChangeKind::Renamed);
            assert_eq!(files[3].path, "q.rs");
            assert!(files[3].patch.is_none());
        }
    }

    mod count_diff_lines {
        use super::*;

        #[test]
        fn hunk_only() {
            assert_eq!(count_diff_lines("@@ -1 +1 @@\n-a\n+b\n+c\n"), (2, 1));
        }

        #[test]
        fn skips_file_headers() {
            let patch = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-a\n+b\n";
            assert_eq!(count_diff_lines(patch), (1, 1));
        }

        #[test]
        fn counts_content_that_looks_like_a_header() {
            let patch = "@@ -1 +1 @@\n---- removed rule\n++++ added rule\n";
            assert_eq!(count_diff_lines(patch), (1, 1));
        }

        #[test]
        fn multiple_files() {
            let patch = "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\ndiff --git a/y b/y\n--- a/y\n+++ b/y\n@@ -0,0 +1 @@\n+c\n";
            assert_eq!(count_diff_lines(patch), (2, 1));
        }

        #[test]
        fn ignores_no_newline_marker_and_context() {
            let patch = "@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n ctx\n";
            assert_eq!(count_diff_lines(patch), (1, 1));
        }

        #[test]
        fn empty() {
            assert_eq!(count_diff_lines(""), (0, 0));
        }
    }

    #[test]
    fn normalize_all_preserves_order() {
        let raw = json!([gitlab_mr("merged"), gitlab_mr("opened")]);
        let all = normalize_all(ForgeProvider::GitLab, raw).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].is_merged());
        assert!(!all[1].is_merged());

        assert!(matches!(
            normalize_all(ForgeProvider::GitLab, json!({"iid": 1})),
            Err(ForgeError::Normalization(_))
        ));
    }
}
