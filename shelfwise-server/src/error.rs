//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shelfwise_core::{ErrorKind, RecommenderError};
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No trained model is loaded yet
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Recommendation engine error
    #[error("Engine error: {0}")]
    Engine(#[from] RecommenderError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not ready error
    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::NotReady(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Engine(ref e) => match e.kind() {
                // Input data filtered down to nothing or lacks columns → 422
                ErrorKind::Data => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::NotReady => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Network => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotReady(_) => "NOT_READY",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Engine(ref e) => match e.kind() {
                ErrorKind::Data => "DATA_ERROR",
                ErrorKind::Io => "IO_ERROR",
                ErrorKind::NotReady => "NOT_READY",
                ErrorKind::Network => "UPSTREAM_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Data errors describe the input and are safe to return
            Self::Engine(RecommenderError::DataError(message)) => message.clone(),
            Self::Engine(RecommenderError::NotReady(_)) => {
                "The recommendation model has not been trained yet".to_string()
            }
            Self::Engine(RecommenderError::DownloadError(_)) => {
                "Dataset download failed".to_string()
            }
            // Paths and decoder details stay in the logs
            Self::Engine(_) => "Dataset or artifact storage error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotReady(_) => "not_ready",
            Self::Internal(_) => "internal",
            Self::Engine(_) => "engine",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_mapping() {
        let data = ApiError::from(RecommenderError::DataError("no rows".into()));
        assert_eq!(data.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(data.error_code(), "DATA_ERROR");
        assert_eq!(data.client_message(), "no rows");

        let artifact = ApiError::from(RecommenderError::ArtifactError("checksum".into()));
        assert_eq!(artifact.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(artifact.error_code(), "IO_ERROR");
        assert!(!artifact.client_message().contains("checksum"));

        let not_ready = ApiError::from(RecommenderError::NotReady("empty".into()));
        assert_eq!(not_ready.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(not_ready.error_code(), "NOT_READY");
    }

    #[test]
    fn test_bad_request_mapping() {
        let err = ApiError::bad_request("book_name is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }
}
