use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A mutating call was attempted with no stored bearer token.
    /// Raised before any network I/O happens.
    #[error("no credential available - login required")]
    MissingCredential,

    /// The login endpoint rejected the submitted email/password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The server answered 401/403. The stored session has already been
    /// cleared by the time the caller sees this.
    #[error("authentication rejected by the server ({status})")]
    AuthRejected { status: StatusCode },

    /// A success response whose body does not match the expected shape.
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),

    /// Any other non-success status.
    #[error("request failed with status {status}: {body}")]
    Failed { status: StatusCode, body: String },

    /// Transport-level failure (DNS, timeout, connection refused).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data in errors
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let truncated: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", truncated, body.len())
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => ApiError::AuthRejected { status },
            _ => ApiError::Failed {
                status,
                body: Self::truncate_body(body),
            },
        }
    }

    /// True when the error means the bearer token was rejected server-side.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ApiError::AuthRejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_auth_rejection() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_auth_rejection());
        assert!(ApiError::from_status(StatusCode::FORBIDDEN, "").is_auth_rejection());
        assert!(!ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom")
            .is_auth_rejection());
    }

    #[test]
    fn test_from_status_other_failure_keeps_body() {
        match ApiError::from_status(StatusCode::BAD_REQUEST, "missing field") {
            ApiError::Failed { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body, "missing field");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(2000);
        match ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::Failed { body, .. } => {
                assert!(body.len() < 600);
                assert!(body.contains("truncated"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
