use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Request-level error taxonomy. Every handler failure becomes a JSON body
/// of the shape `{"error": message}` with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input, including unparsable path ids.
    #[error("{0}")]
    Validation(String),
    /// No session, an invalid/expired session, wrong role, or bad credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Another active account already holds the email.
    #[error("{0}")]
    Conflict(String),
    /// An update or delete matched no active row.
    #[error("{0}")]
    NotFound(String),
    /// Hashing, signing, or database transport failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            // Duplicate email and zero-row writes are contract-level 400s,
            // matching the client's expectations for this API.
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let message = match &self {
            // Internals carry backend detail; never echo that to the client.
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(anyhow::Error::new(err).context("database query failed"))
    }
}
