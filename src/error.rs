// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::configuration::ConfigStoreError;
use crate::database::PersistenceError;

/// HTTP API error with a stable code and a client-safe message
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError(String),
    DuplicateName(String),
    LimitExceeded(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),
    UserNotFound(String),

    // 500 Internal Server Error
    EncryptFailed(String),
    PersistenceFailed(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::DuplicateName(_) | ApiError::LimitExceeded(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) | ApiError::UserNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::EncryptFailed(_) | ApiError::PersistenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError(msg)
            | ApiError::DuplicateName(msg)
            | ApiError::LimitExceeded(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::UserNotFound(msg)
            | ApiError::EncryptFailed(msg)
            | ApiError::PersistenceFailed(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::DuplicateName(_) => "DUPLICATE_NAME",
            ApiError::LimitExceeded(_) => "LIMIT_EXCEEDED",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::UserNotFound(_) => "USER_NOT_FOUND",
            ApiError::EncryptFailed(_) => "ENCRYPT_FAILED",
            ApiError::PersistenceFailed(_) => "PERSISTENCE_FAILED",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation_error(message: impl Into<String>) -> Self {
        ApiError::ValidationError(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<ConfigStoreError> for ApiError {
    fn from(err: ConfigStoreError) -> Self {
        match err {
            ConfigStoreError::Validation(msg) => ApiError::ValidationError(msg),
            e @ ConfigStoreError::DuplicateName(_) => ApiError::DuplicateName(e.to_string()),
            e @ ConfigStoreError::LimitExceeded => ApiError::LimitExceeded(e.to_string()),
            ConfigStoreError::UserNotFound(id) => {
                tracing::warn!("Configuration request for unknown user {}", id);
                ApiError::UserNotFound("User not found".to_string())
            }
            ConfigStoreError::EncryptFailed(detail) => {
                // Crypto detail stays in the logs
                tracing::error!("Configuration encryption error: {}", detail);
                ApiError::EncryptFailed("Could not save configurations".to_string())
            }
            ConfigStoreError::PersistenceFailed(detail) => {
                tracing::error!("Configuration persistence error: {}", detail);
                ApiError::PersistenceFailed("Could not reach storage, please retry".to_string())
            }
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        tracing::error!("Persistence error: {}", err);
        ApiError::PersistenceFailed("Could not reach storage, please retry".to_string())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
