// Error types for the memo client library.
// One typed failure channel for validation, API, transport, and timeout errors.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoError {
    /// Caller-supplied input is malformed. Raised before any cache or
    /// network access; never produced by the remote API.
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    /// The remote API rejected the request with a non-2xx status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Network failure, malformed response body, or a missing response.
    /// Carries no status code.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The connectivity probe's bounded wait elapsed before the request
    /// completed. Only produced by `MemoClient::test_connection`.
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    /// A session-backed operation was called without a logged-in user.
    #[error("Not logged in")]
    NotLoggedIn,
}

/// Error bodies may carry a human-readable `message` field; everything else
/// in the body is ignored.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl MemoError {
    /// Translate a non-2xx response into an `Api` error.
    ///
    /// The message is taken from a `message` field of the decoded error body
    /// when present, otherwise from the status line.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| status_line(status));
        MemoError::Api { status, message }
    }
}

/// Status line for a code, e.g. `404 Not Found`, or `HTTP 499` for codes
/// without a canonical reason.
fn status_line(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(|reason| format!("{status} {reason}"))
        .unwrap_or_else(|| format!("HTTP {status}"))
}

impl From<reqwest::Error> for MemoError {
    fn from(err: reqwest::Error) -> Self {
        MemoError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MemoError>;
