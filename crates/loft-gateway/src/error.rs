//! Gateway error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request has no usable host")]
    MissingHost,

    #[error("Request build failed: {0}")]
    RequestBuildFailed(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingHost => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::RequestBuildFailed(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Sanitise error messages for external responses
        let message = match &self {
            Self::MissingHost => "Request has no usable host".to_owned(),
            Self::Upstream(_) => "Upstream unavailable".to_owned(),
            Self::Config(_) | Self::RequestBuildFailed(_) | Self::Io(_) => {
                "Internal server error".to_owned()
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(GatewayError::MissingHost.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::Config("bad".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            GatewayError::MissingHost.to_string(),
            "Request has no usable host"
        );
        assert_eq!(
            GatewayError::Config("bad".into()).to_string(),
            "Configuration error: bad"
        );
    }
}
