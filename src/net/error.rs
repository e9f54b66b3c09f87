//! Fetch error taxonomy and backend error-body decoding.
//!
//! ERROR HANDLING
//! ==============
//! The backend reports failures as `{detail?, message?}` but may also answer
//! with HTML or plain text. The body is read as text first and then checked for
//! JSON, so a non-JSON error never masks the HTTP status.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// A 2xx body could not be decoded as the expected type.
    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    /// No bearer token was available for an authenticated call.
    #[error("missing bearer token")]
    MissingToken,
    /// A header name or value supplied by the caller is not valid HTTP.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// A request URL could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// HTTP status for server-reported failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend rejected the credential (401 or 403).
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// Error body shape returned by the backend.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parse `raw` as an error body; anything that is not a JSON object yields `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// First non-blank of `detail`, then `message`.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        [self.detail, self.message]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
    }
}

/// Human-readable status text, e.g. `"Not Found"`.
#[must_use]
pub fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| format!("HTTP {}", status.as_u16()), ToOwned::to_owned)
}

/// Message for a failed response: `detail`, then `message`, then status text.
#[must_use]
pub fn error_message(status: StatusCode, body: &str) -> String {
    ErrorBody::parse(body)
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| status_text(status))
}

/// Build the [`FetchError`] for a non-2xx response.
#[must_use]
pub fn status_error(status: StatusCode, body: &str) -> FetchError {
    FetchError::Status { status: status.as_u16(), message: error_message(status, body) }
}
