// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use tracing::{error, warn};

/// Authentication and authorization error types surfaced to HTTP callers
#[derive(Debug)]
pub enum AuthError {
    // Authentication errors
    ValidationError(String),
    /// Unknown username or wrong password; never says which
    InvalidCredentials,
    /// Username already taken. Carries the conflicting field name.
    DuplicateIdentity { field: &'static str },
    /// No authenticated identity is bound to the request
    Unauthenticated,
    UnknownUser(String),
    StoreError(String),
    PasswordHashError,
    TokenGenerationError(String),

    // Authorization errors
    /// Authenticated, but the role claims do not satisfy the route rule
    InsufficientRole,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthError::DuplicateIdentity { field } => write!(f, "Duplicate {}", field),
            AuthError::Unauthenticated => write!(f, "Authentication required"),
            AuthError::UnknownUser(username) => write!(f, "User '{}' not found", username),
            AuthError::StoreError(msg) => write!(f, "Credential store error: {}", msg),
            AuthError::PasswordHashError => write!(f, "Password hashing error"),
            AuthError::TokenGenerationError(msg) => write!(f, "Token generation error: {}", msg),
            AuthError::InsufficientRole => write!(f, "Insufficient role"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AuthError::StoreError(msg) => error!("Credential store error: {}", msg),
            AuthError::PasswordHashError => error!("Password hashing error"),
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
            AuthError::InvalidCredentials => warn!("Rejected login attempt"),
            AuthError::Unauthenticated => warn!("Unauthenticated request to protected route"),
            AuthError::InsufficientRole => warn!("Authenticated request denied by role check"),
            _ => {}
        }

        let body = match &self {
            AuthError::DuplicateIdentity { field } => json!({
                "error": self.error_message(),
                "field": field,
            }),
            _ => json!({
                "error": self.error_message(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::DuplicateIdentity { .. } => StatusCode::CONFLICT,
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::UnknownUser(_) => StatusCode::NOT_FOUND,
            AuthError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::PasswordHashError => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::ValidationError(msg) => msg.clone(),
            AuthError::InvalidCredentials => "Invalid username or password".to_string(),
            AuthError::DuplicateIdentity { field } => format!("{} already exists", field),
            AuthError::Unauthenticated => "Authentication required".to_string(),
            AuthError::UnknownUser(_) => "User not found".to_string(),
            AuthError::StoreError(_) => "Internal server error".to_string(),
            AuthError::PasswordHashError => "Internal server error".to_string(),
            AuthError::TokenGenerationError(_) => "Internal server error".to_string(),
            AuthError::InsufficientRole => "Access denied".to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(errors.to_string())
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(error: sqlx::Error) -> Self {
        AuthError::StoreError(error.to_string())
    }
}

/// Token validation outcomes. Internal to the token service and the
/// authentication gate; never rendered as a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token subject mismatch")]
    SubjectMismatch,
}
