//! Error types for the demo service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Service-level errors raised during startup and serving.
#[derive(Debug, Error)]
pub enum DemoError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-level errors returned to clients.
#[derive(Debug, Error)]
#[allow(dead_code)]
pub enum ApiError {
    /// The deliberately failing demo endpoint.
    #[error("Simulated error occurred")]
    SimulatedFailure,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::SimulatedFailure => (StatusCode::INTERNAL_SERVER_ERROR, "SIMULATED_FAILURE"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for service operations
pub type DemoResult<T> = Result<T, DemoError>;
