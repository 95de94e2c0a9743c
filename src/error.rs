// Error handling for the roster endpoints
// Provides the ApiError type and its HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};

/// Error type for team and player handlers.
///
/// Each variant maps to one HTTP status code. Database failures are logged
/// in full and reported to clients with a generic body.
#[derive(Debug)]
pub enum ApiError {
    /// Request body failed validation (400)
    ValidationError(validator::ValidationErrors),

    /// No row with the given id (404)
    NotFound { resource: &'static str, id: i64 },

    /// Unique constraint hit, e.g. duplicate team name (409)
    Conflict { message: String },

    /// Referenced row does not exist, e.g. unknown team_id (400)
    InvalidReference { message: String },

    /// Any other database failure (500)
    DatabaseError(sqlx::Error),
}

/// JSON body of every roster error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Field-level validation failures, omitted when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_error_response();
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                let details = serde_json::to_value(errors).unwrap_or(serde_json::json!({}));
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Request validation failed".to_string(),
                        details: Some(details),
                    },
                )
            }
            ApiError::NotFound { resource, id } => {
                debug!("{} {} not found", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new(format!("{} with id {} not found", resource, id)),
                )
            }
            ApiError::Conflict { message } => {
                warn!("Conflict: {}", message);
                (StatusCode::CONFLICT, ErrorResponse::new(message.clone()))
            }
            ApiError::InvalidReference { message } => {
                debug!("Invalid reference: {}", message);
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message.clone()))
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {:?}", db_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::InvalidReference { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::DatabaseError(error)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}
