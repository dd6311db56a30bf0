//! Control plane error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type alias using [`ControlError`].
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in the control plane.
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("execution backend rejected the job: {0}")]
    BackendRejected(String),

    #[error("log bus error: {0}")]
    Bus(#[from] redis::RedisError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ControlError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRepoUrl(_) => StatusCode::BAD_REQUEST,
            Self::DispatchFailed(_) | Self::BackendRejected(_) | Self::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Config(_) | Self::Bus(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Sanitise error messages for external responses
        let message = match &self {
            Self::InvalidRepoUrl(reason) => format!("invalid repository URL: {reason}"),
            Self::DispatchFailed(_) | Self::BackendRejected(_) | Self::Http(_) => {
                "deployment submission failed".to_owned()
            }
            Self::Config(_) | Self::Bus(_) | Self::Io(_) => "internal server error".to_owned(),
        };

        let body = axum::Json(serde_json::json!({
            "status": "error",
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ControlError::InvalidRepoUrl("empty".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ControlError::DispatchFailed("unreachable".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ControlError::Config("missing".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
