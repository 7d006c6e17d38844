//! Error types for the HTTP API and for mounting

use crate::api::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;
use thiserror::Error;

/// Message sent with every 401
pub const INVALID_SECRET_KEY: &str = "Invalid secret key";

/// Request-time failure, rendered as `{ "message": ... }`
#[derive(Debug)]
pub enum ApiError {
    /// Missing or wrong secret header (401)
    Unauthorized,

    /// The engine rejected the operation (500)
    Operation(String),
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Status code this error renders with
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Operation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::Operation(_) => "operation_failed",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "{}", INVALID_SECRET_KEY),
            ApiError::Operation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ferry_core::FerryError> for ApiError {
    fn from(err: ferry_core::FerryError) -> Self {
        ApiError::Operation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Mount-time configuration failure. Never becomes an HTTP response.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Empty secret
    #[error("secretKey is required")]
    SecretKeyRequired,

    /// No engine context supplied
    #[error("context is required")]
    ContextRequired,

    /// No storage backend supplied
    #[error("storage is required")]
    StorageRequired,

    /// Settings document is not a table/object
    #[error("options must be an object")]
    NotAnObject,

    /// Settings document has the wrong shape
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
