//! Error types for mediadl
//!
//! This module provides error handling for the library, including:
//! - The crate-wide [`Error`] enum and [`Result`] alias
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::TaskId;

/// Result type alias for mediadl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mediadl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "MEDIADL_PORT")
        key: Option<String>,
    },

    /// Client input rejected before any task was created
    #[error("validation error: {0}")]
    Validation(String),

    /// No task registered under this id
    #[error("task {id} not found")]
    TaskNotFound {
        /// The task id that was looked up
        id: TaskId,
    },

    /// A task with this id already exists
    #[error("conflict: {0}")]
    Conflict(String),

    /// Generic missing resource (e.g. a file under the download root)
    #[error("not found: {0}")]
    NotFound(String),

    /// Requested path escapes the download root
    #[error("path {path} is outside the download directory")]
    ForbiddenPath {
        /// The offending path, as the client supplied it
        path: PathBuf,
    },

    /// The download engine failed while running a job
    #[error("{0}")]
    Engine(String),

    /// Opening or revealing a path in the platform file manager failed
    #[error("file manager error: {0}")]
    Platform(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Operation not supported (missing binary, unsupported platform, ...)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task 9f0c... not found",
///     "details": {
///       "task_id": "9f0c..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,

            // 403 Forbidden - path containment violations
            Error::ForbiddenPath { .. } => 403,

            // 404 Not Found
            Error::TaskNotFound { .. } => 404,
            Error::NotFound(_) => 404,

            // 409 Conflict
            Error::Conflict(_) => 409,

            // 500 Internal Server Error - Server-side issues
            Error::Platform(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 501 Not Implemented - Feature not supported
            Error::NotSupported(_) => 501,

            // 502 Bad Gateway - the external engine failed
            Error::Engine(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::ForbiddenPath { .. } => "forbidden_path",
            Error::TaskNotFound { .. } => "task_not_found",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Platform(_) => "platform_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
            Error::NotSupported(_) => "not_supported",
            Error::Engine(_) => "engine_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::TaskNotFound { id } => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::ForbiddenPath { path } => Some(serde_json::json!({
                "path": path,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
