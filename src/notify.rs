//! notify
//!
//! Best-effort chat notification for newly created change requests.
//!
//! The payload is a single `{"text": ...}` object, which is what Slack
//! incoming webhooks (and most compatible services) accept. Delivery is
//! bounded by a short timeout; callers log failures and move on.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use thiserror::Error;

use crate::forge::ChangeRequest;
use crate::git::RepositoryContext;

/// Bound on a webhook delivery.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from webhook delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid webhook url: {0}")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("webhook request failed: {0}")]
    Request(String),

    #[error("webhook rejected the message with status {status}")]
    Rejected { status: u16 },
}

/// Posts change-request announcements to a webhook.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    webhook: reqwest::Url,
}

impl Notifier {
    /// Create a notifier for the given webhook URL.
    pub fn new(webhook: &str) -> Result<Self, NotifyError> {
        let webhook = reqwest::Url::parse(webhook.trim())
            .map_err(|e| NotifyError::InvalidUrl(e.to_string()))?;
        if !matches!(webhook.scheme(), "http" | "https") {
            return Err(NotifyError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                webhook.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;

        Ok(Self { client, webhook })
    }

    /// Announce a freshly created change request.
    pub async fn notify_created(
        &self,
        repo: &RepositoryContext,
        cr: &ChangeRequest,
    ) -> Result<(), NotifyError> {
        let payload = json!({ "text": created_message(repo, cr) });

        let response = self
            .client
            .post(self.webhook.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!(number = cr.number, "notification delivered");
        Ok(())
    }
}

/// Render the announcement text.
pub fn created_message(repo: &RepositoryContext, cr: &ChangeRequest) -> String {
    let kind = if cr.draft { "New draft" } else { "New" };
    format!(
        "🚀 *{} change request* in `{}`\n*Title:* {}\n*Author:* {}\n*Link:* {}",
        kind,
        repo.slug(),
        cr.title,
        cr.author,
        cr.url
    )
}
