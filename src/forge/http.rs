//! forge::http
//!
//! HTTP plumbing shared by the provider clients: client construction,
//! response decoding, and the status → [`ForgeError`] mapping.
//!
//! # Status Mapping
//!
//! | Status          | Error                                   |
//! |-----------------|-----------------------------------------|
//! | 401             | `AuthFailed`                            |
//! | 403             | `PermissionDenied`                      |
//! | 404             | `NotFound` (callers narrow it)          |
//! | 400 / 409 / 422 | `CreateFailed` / `UpdateFailed` / `Api` |
//! | 429, 5xx        | `Transient`                             |
//! | other           | `Api`                                   |

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::traits::ForgeError;

/// Bound on every provider API call.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent header value for API requests.
pub(crate) const USER_AGENT_VALUE: &str = concat!("gitpr/", env!("CARGO_PKG_VERSION"));

/// Page size for paginated listings (the maximum both providers accept).
pub(crate) const PER_PAGE: usize = 100;

/// What kind of call produced a response; decides how 4xx rejections map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Read,
    Create,
    Update,
}

/// Build a client with default headers and the request timeout.
pub(crate) fn build_client(headers: HeaderMap) -> Result<Client, ForgeError> {
    Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ForgeError::Config(format!("failed to build HTTP client: {}", e)))
}

/// Map a failure to send a request.
pub(crate) fn send_error(err: reqwest::Error) -> ForgeError {
    if err.is_timeout() {
        ForgeError::Transient(format!("request timed out: {}", err))
    } else {
        ForgeError::Transient(format!("network error: {}", err))
    }
}

/// Decode a successful JSON response, or map the error status.
pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: Response,
    op: Operation,
) -> Result<T, ForgeError> {
    if !response.status().is_success() {
        return Err(error_for_response(response, op).await);
    }

    let bytes = response.bytes().await.map_err(send_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ForgeError::Normalization(format!("failed to parse response: {}", e)))
}

/// Succeed on any 2xx, ignoring the body.
pub(crate) async fn expect_success(response: Response, op: Operation) -> Result<(), ForgeError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_for_response(response, op).await)
    }
}

/// Consume an error response into a [`ForgeError`].
pub(crate) async fn error_for_response(response: Response, op: Operation) -> ForgeError {
    let status = response.status();
    let message = match response.text().await {
        Ok(text) => serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| extract_message(&v))
            .unwrap_or_else(|| fallback_message(status, &text)),
        Err(_) => fallback_message(status, ""),
    };

    tracing::debug!(status = status.as_u16(), %message, "provider returned an error");
    status_error(status, message, op)
}

/// Map a non-success status and the provider's message.
pub(crate) fn status_error(status: StatusCode, message: String, op: Operation) -> ForgeError {
    match status {
        StatusCode::UNAUTHORIZED => ForgeError::AuthFailed(format!(
            "invalid or expired token ({})",
            message
        )),
        StatusCode::FORBIDDEN => ForgeError::PermissionDenied(message),
        StatusCode::NOT_FOUND => ForgeError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            match op {
                Operation::Create => ForgeError::CreateFailed(message),
                Operation::Update => ForgeError::UpdateFailed(message),
                Operation::Read => ForgeError::Api {
                    status: status.as_u16(),
                    message,
                },
            }
        }
        StatusCode::TOO_MANY_REQUESTS => ForgeError::Transient(format!("rate limited: {}", message)),
        _ if status.is_server_error() => ForgeError::Transient(format!(
            "server error {}: {}",
            status.as_u16(),
            message
        )),
        _ => ForgeError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Fold a failed create into `CreateFailed`.
///
/// Auth, permission and transient failures keep their own kinds; any other
/// rejection (404 for a missing repository, an unexpected status) becomes
/// `CreateFailed` with the provider's message.
pub(crate) fn create_rejection(err: ForgeError) -> ForgeError {
    match err {
        ForgeError::NotFound(message) => ForgeError::CreateFailed(message),
        ForgeError::Api { status, message } => {
            ForgeError::CreateFailed(format!("{} ({})", message, status))
        }
        other => other,
    }
}

/// Narrow a generic 404 to the change request that was asked for.
pub(crate) fn not_found_as_change_request(err: ForgeError, number: u64) -> ForgeError {
    match err {
        ForgeError::NotFound(_) => ForgeError::ChangeRequestNotFound { number },
        other => other,
    }
}

fn fallback_message(status: StatusCode, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        text.chars().take(200).collect()
    }
}

/// Pull the human-readable diagnostic out of an error body.
///
/// GitHub: `{"message": "...", "errors": [{"message": ...} | {"field", "code"}]}`.
/// GitLab: `{"message": "..." | ["..."] | {"field": ["..."]}}` or `{"error": "..."}`.
pub(crate) fn extract_message(body: &Value) -> Option<String> {
    let base = body
        .get("message")
        .and_then(flatten_message)
        .or_else(|| body.get("error").and_then(Value::as_str).map(String::from))?;

    let details: Vec<String> = body
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| errors.iter().filter_map(error_detail).collect())
        .unwrap_or_default();

    if details.is_empty() {
        Some(base)
    } else {
        Some(format!("{}: {}", base, details.join("; ")))
    }
}

fn flatten_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(flatten_message).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Object(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .filter_map(|(field, v)| flatten_message(v).map(|m| format!("{} {}", field, m)))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

fn error_detail(value: &Value) -> Option<String> {
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    if let Some(msg) = value.get("message").and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    let field = value.get("field").and_then(Value::as_str)?;
    let code = value.get("code").and_then(Value::as_str).unwrap_or("invalid");
    Some(format!("{} {}", field, code))
}
