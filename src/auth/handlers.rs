// HTTP handlers for authentication endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{AuthResponse, LoginRequest, RegisterRequest, UserResponse},
    service::AuthService,
};

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Blank username or password"),
        (status = 409, description = "Username already exists", body = String, example = json!({"error": "username already exists", "field": "username"}))
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    tracing::debug!("Registration request for '{}'", request.username);
    let response = service.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login a user
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = AuthResponse),
        (status = 401, description = "Invalid username or password", body = String, example = json!({"error": "Invalid username or password"}))
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = service.login(request).await?;
    Ok(Json(response))
}

/// Get current user information
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(service): State<Arc<AuthService>>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    let user = service.current_user(&principal.username).await?;
    Ok(Json(user))
}

/// Get a user profile. Only the user themselves may read it.
#[utoipa::path(
    get,
    path = "/api/users/{username}",
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn user_profile_handler(
    State(service): State<Arc<AuthService>>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AuthError> {
    if principal.username != username {
        tracing::warn!(
            "'{}' attempted to read profile of '{}'",
            principal.username,
            username
        );
        return Err(AuthError::InsufficientRole);
    }

    let user = service.current_user(&username).await?;
    Ok(Json(user))
}
