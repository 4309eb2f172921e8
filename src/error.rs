//! Error types for the store backend.
//!
//! Every service and handler returns [`Result<T>`]. The HTTP layer turns an
//! [`Error`] into a `{success: false, message}` body through a single
//! `IntoResponse` implementation, so handlers never build error responses by
//! hand.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the store backend.
///
/// Variants fall into two families:
/// - **Client errors** (`NotFound`, `Unauthorized`, `Forbidden`,
///   `ValidationError`) carry a message that is safe to show to the caller.
/// - **Server errors** (everything else) are logged in full and surface as a
///   generic 500, except `UpstreamError` which is reported as 502.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Requested product, order or user does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Caller could not be identified (missing or unknown id).
    #[error("{0}")]
    Unauthorized(String),

    /// Caller is known but lacks the admin role.
    #[error("{0}")]
    Forbidden(String),

    /// Request is missing required fields or carries invalid values.
    ///
    /// Raised for:
    /// - missing product or order fields
    /// - photo count outside `1..=5`
    /// - malformed ids and multipart payloads
    #[error("{0}")]
    ValidationError(String),

    /// The media store rejected or failed an upload.
    ///
    /// Uploads propagate this error; deletes collect it into a
    /// [`DeleteReport`](crate::media::DeleteReport) instead.
    #[error("Media store error: {0}")]
    UpstreamError(String),

    /// Serialization failed when converting a value to cache bytes.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization failed when converting cache bytes to a value.
    ///
    /// **Recovery:** the read-through path evicts the entry and reloads it.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Cache entry header is invalid (bad magic or corrupted envelope).
    #[error("Invalid cache entry: {0}")]
    InvalidCacheEntry(String),

    /// Cache entry was written by a different schema version.
    #[error("Cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Cache backend storage error (Redis connection lost, etc).
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Data repository error.
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// Invalid or missing configuration at start-up.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Generic error with custom message.
    #[error("Error: {0}")]
    Other(String),
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    /// Shorthand for [`Error::ValidationError`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::ValidationError(message.into())
    }

    /// HTTP status code the centralized responder uses for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::ValidationError(_) => StatusCode::BAD_REQUEST,
            Error::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Server-side failures are not leaked.
    pub fn public_message(&self) -> String {
        match self {
            Error::NotFound(msg)
            | Error::Unauthorized(msg)
            | Error::Forbidden(msg)
            | Error::ValidationError(msg) => msg.clone(),
            Error::UpstreamError(_) => self.to_string(),
            _ => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status.as_u16(), self);
        } else {
            debug!("Request rejected ({}): {}", status.as_u16(), self);
        }

        let body = json!({
            "success": false,
            "message": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::ValidationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::UpstreamError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ValidationError("Please enter all fields".to_string());
        assert_eq!(err.to_string(), "Please enter all fields");

        let err = Error::VersionMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(err.to_string(), "Cache version mismatch: expected 2, found 1");
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::not_found("Product Not Found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Unauthorized("Login First".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::Forbidden("Only admin can access this".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::BackendError("redis down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_are_not_leaked() {
        let err = Error::RepositoryError("connection refused at 10.0.0.3".into());
        assert_eq!(err.public_message(), "Internal Server Error");

        let err = Error::not_found("Order Not Found");
        assert_eq!(err.public_message(), "Order Not Found");
    }
}
