// Authentication service - business logic layer

use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, Role, User, UserResponse},
    password::PasswordService,
    repository::CredentialStore,
    token::TokenService,
};

/// Authentication service coordinating registration and login
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    token_service: Arc<TokenService>,
}

impl AuthService {
    /// Create a new AuthService
    ///
    /// Computes the unknown-user digest up front so no login pays for it.
    pub fn new(store: Arc<dyn CredentialStore>, token_service: Arc<TokenService>) -> Self {
        if let Err(e) = dummy_digest() {
            warn!("Could not precompute dummy digest: {}", e);
        }
        Self {
            store,
            token_service,
        }
    }

    pub fn token_service(&self) -> Arc<TokenService> {
        self.token_service.clone()
    }

    /// Register a new USER identity and return a token for it.
    ///
    /// Duplicate usernames are detected by the store's insert alone.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let user = self
            .create_identity(request.username, request.password, Role::User)
            .await?;
        info!("Registered user '{}'", user.username);

        let token = self.token_service.issue_for(&user)?;
        Ok(AuthResponse { token })
    }

    /// Login a user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let user = self.store.find_by_username(&request.username).await?;

        let digest = user.as_ref().map(|user| user.password_hash.clone());
        let verified = verify_blocking(request.password, digest).await?;

        match user {
            Some(user) if verified => {
                debug!("Login succeeded for '{}'", user.username);
                let token = self.token_service.issue_for(&user)?;
                Ok(AuthResponse { token })
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    /// Get current user information
    pub async fn current_user(&self, username: &str) -> Result<UserResponse, AuthError> {
        self.store
            .find_by_username(username)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))
    }

    /// Ensure an ADMIN account exists. Returns `false` when the username was
    /// already taken, in which case the existing account is left alone.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        match self
            .create_identity(username.to_string(), password.to_string(), Role::Admin)
            .await
        {
            Ok(user) => {
                info!("Created administrator account '{}'", user.username);
                Ok(true)
            }
            Err(AuthError::DuplicateIdentity { .. }) => {
                warn!("Administrator account '{}' already exists, skipping", username);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_identity(
        &self,
        username: String,
        password: String,
        role: Role,
    ) -> Result<User, AuthError> {
        let password_hash = hash_blocking(password).await?;

        self.store
            .insert(NewUser {
                username,
                password_hash,
                role,
            })
            .await
    }
}

// Argon2 is CPU-bound; keep it off the async worker threads
async fn hash_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || PasswordService::hash_password(&password))
        .await
        .map_err(|_| AuthError::PasswordHashError)?
}

// `None` verifies against the dummy digest and always reports a mismatch
async fn verify_blocking(password: String, digest: Option<String>) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || -> Result<bool, AuthError> {
        match digest {
            Some(digest) => Ok(PasswordService::verify_password(&password, &digest)),
            None => {
                PasswordService::verify_password(&password, dummy_digest()?);
                Ok(false)
            }
        }
    })
    .await
    .map_err(|_| AuthError::PasswordHashError)?
}

/// Digest verified against when the username is unknown, so both failure
/// paths pay for one hash verification.
static DUMMY: OnceLock<String> = OnceLock::new();

fn dummy_digest() -> Result<&'static str, AuthError> {
    if let Some(digest) = DUMMY.get() {
        return Ok(digest);
    }
    let digest = PasswordService::hash_password("nba-api-dummy-password")?;
    Ok(DUMMY.get_or_init(|| digest))
}
