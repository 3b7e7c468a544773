//! Structured error types for API responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (400)
    MissingRequiredField,
    InvalidFieldValue,
    AlreadyExists,
    InvalidResetToken,

    // Auth errors (401/403)
    InvalidCredentials,
    MissingToken,
    InvalidToken,
    Forbidden,

    // Not found errors (404)
    EmployeeNotFound,
    TaskNotFound,

    // Internal errors (500)
    DatabaseError,
    EmailError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::AlreadyExists
            | ErrorCode::InvalidResetToken => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidCredentials | ErrorCode::MissingToken | ErrorCode::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::EmployeeNotFound | ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::DatabaseError | ErrorCode::EmailError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error for API responses. The wire body is always
/// `{"message": ...}`; the code only selects the HTTP status and the
/// server-side log line.
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
    }

    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason)
    }

    pub fn already_exists() -> Self {
        Self::new(ErrorCode::AlreadyExists, "User already exists")
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Invalid credentials")
    }

    pub fn missing_token() -> Self {
        Self::new(ErrorCode::MissingToken, "Authentication token required")
    }

    pub fn invalid_token() -> Self {
        Self::new(ErrorCode::InvalidToken, "Invalid or expired token")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn employee_not_found() -> Self {
        Self::new(ErrorCode::EmployeeNotFound, "Employee not found")
    }

    pub fn task_not_found() -> Self {
        Self::new(ErrorCode::TaskNotFound, "Task not found")
    }

    pub fn invalid_reset_token() -> Self {
        Self::new(
            ErrorCode::InvalidResetToken,
            "Password reset token is invalid or has expired",
        )
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EmailError, message)
    }

    /// Internal failure with a generic caller-facing message. The underlying
    /// error must be logged by the caller; it is never sent to the client.
    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalError, "Server error")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Try to downcast to ApiError first
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => {
                tracing::error!(error = %err, "Unexpected internal error");
                ApiError::internal()
            }
        }
    }
}

/// Wire body for error responses.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = ?self.code, message = %self.message, "Request failed");
        } else {
            tracing::debug!(code = ?self.code, message = %self.message, "Request rejected");
        }
        (
            status,
            Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
