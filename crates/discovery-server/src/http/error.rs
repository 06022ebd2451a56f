//! Client-facing error mapping.
//!
//! Internal detail (store errors, namespace paths) never reaches the response
//! body; clients get a fixed message. The core library already logs setup and
//! teardown failures, so rejections are only traced here at `debug`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The `size` parameter isn't a positive integer.
    #[error("{0}")]
    InvalidSize(String),

    /// Token generation or namespace setup failed.
    #[error("setup failed: {0}")]
    Setup(discovery::Error),

    /// The path segment isn't a well-formed token.
    #[error("invalid token: {0}")]
    InvalidToken(discovery::Error),

    /// No namespace exists for the token.
    #[error("token not found: {0}")]
    TokenNotFound(discovery::Error),

    /// The store rejected the teardown.
    #[error("teardown failed: {0}")]
    Teardown(discovery::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSize(_) | Self::Setup(_) | Self::InvalidToken(_) | Self::Teardown(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::TokenNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message written to the response body.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidSize(reason) => reason.clone(),
            Self::Setup(_) => "Unable to generate token".to_owned(),
            Self::InvalidToken(_) => "Invalid token".to_owned(),
            Self::TokenNotFound(_) => "Token not found".to_owned(),
            Self::Teardown(_) => "Unable to delete token".to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(%status, error = %self, "request rejected");
        (status, self.public_message()).into_response()
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;
