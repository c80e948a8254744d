//! # error
//!
//! Centralised error types.
//!
//! * [`TransportError`]: what actually went wrong talking to the service.
//! * [`ApiError`]: the caller-facing form, a human-readable `message` plus
//!   the original failure as opaque `details`. Cheap to clone so the same
//!   error can sit in observable state and be returned to the caller.
//! * [`ConfigError`]: bad environment configuration.
//!
//! Stream payloads that fail to parse are not errors at this level; the sync
//! loop records them as a message in `SyncState::error`.

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The service answered with a non-2xx status.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Connection refused, reset, DNS failure, body read failure...
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// A 2xx body that is not the JSON we expected.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    /// Non-2xx failure. The message is the response body when there is one,
    /// otherwise the status reason phrase.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = if body.is_empty() {
            status_text(status)
        } else {
            body.to_string()
        };
        TransportError::Status { status, message }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request(e) => e.status(),
            TransportError::Decode(_) => None,
        }
    }
}

/// A failed call, as exposed to callers and observable state.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    #[source]
    pub details: Arc<TransportError>,
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        Self {
            message: err.to_string(),
            details: Arc::new(err),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::from(err).into()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown BASKET_SYNC_MODE: '{0}'. Use 'poll' or 'push'")]
    InvalidMode(String),

    #[error("BASKET_POLL_INTERVAL_MS must be a positive number of milliseconds, got '{0}'")]
    InvalidInterval(String),
}

/// The reason phrase a browser would report as `statusText`.
pub fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_prefers_body() {
        let err = TransportError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "weights must sum to 1");
        assert_eq!(err.to_string(), "weights must sum to 1");
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn test_status_message_falls_back_to_reason() {
        let err = TransportError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn test_api_error_keeps_details() {
        let api: ApiError = TransportError::from_status(StatusCode::BAD_GATEWAY, "").into();
        assert_eq!(api.message, "Bad Gateway");
        assert_eq!(api.details.status(), Some(StatusCode::BAD_GATEWAY));
        let cloned = api.clone();
        assert!(Arc::ptr_eq(&api.details, &cloned.details));
    }

    #[test]
    fn test_decode_error_message() {
        let decode = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let api: ApiError = TransportError::from(decode).into();
        assert!(api.message.starts_with("malformed response body"));
    }
}
