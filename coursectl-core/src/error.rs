//! Structured error types for coursectl-core.
//!
//! Data sources report failures as [`FetchError`]; the listing component folds
//! every one of them into a recoverable [`ListError`] stored in its state.
//! Binary crates (coursectl-cli) still use `anyhow` for plumbing.

use serde::Serialize;
use thiserror::Error;

/// Upper bound on how much of an error response body is kept
const MAX_BODY_LEN: usize = 500;

/// Failure reported by a [`crate::DataSource`] while fetching a page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS or timeout failure before a response arrived
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// Remote answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response arrived but could not be decoded
    #[error("failed to decode {context}: {reason}")]
    Decode { context: String, reason: String },
}

/// The kinds of error the listing component distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Any transport, status or parse failure of a page fetch
    Network,
}

/// Error surfaced to the view through `ListState::error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListError {
    pub kind: ErrorKind,
    pub message: String,
}

impl FetchError {
    /// Create a transport error
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Create a status error, truncating the body so large error pages stay out of logs
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > MAX_BODY_LEN {
            let mut cut = MAX_BODY_LEN;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push_str("...");
        }
        Self::Status { status, body }
    }

    /// Create a decode error with context
    pub fn decode(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Network
    }
}

impl From<&FetchError> for ListError {
    fn from(err: &FetchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ErrorKind::Network => write!(f, "network error: {}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::status(503, "Service Unavailable");
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");

        let err = FetchError::decode("learning objects page", "missing field `data`");
        assert!(err.to_string().contains("learning objects page"));
    }

    #[test]
    fn test_status_body_truncated() {
        let err = FetchError::status(500, "x".repeat(2000));
        match err {
            FetchError::Status { body, .. } => {
                assert_eq!(body.len(), MAX_BODY_LEN + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_status_truncation_respects_char_boundaries() {
        let err = FetchError::status(500, "é".repeat(400));
        assert!(matches!(err, FetchError::Status { .. }));
    }

    #[test]
    fn test_every_fetch_error_is_network() {
        let errors = [
            FetchError::transport("connection reset"),
            FetchError::status(404, ""),
            FetchError::decode("page", "eof"),
        ];
        for err in &errors {
            let list_err = ListError::from(err);
            assert_eq!(list_err.kind, ErrorKind::Network);
            assert!(list_err.to_string().starts_with("network error"));
        }
    }
}
