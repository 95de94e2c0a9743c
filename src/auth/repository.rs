// Credential store: lookup-by-username and insert over user identities

use axum::async_trait;
use sqlx::PgPool;

use crate::auth::{
    error::AuthError,
    models::{NewUser, User, UserRow},
};

/// Persistence contract the auth core depends on.
///
/// `insert` must fail with `AuthError::DuplicateIdentity` when the username
/// is taken; callers never pre-check.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    async fn insert(&self, user: NewUser) -> Result<User, AuthError>;
}

/// Postgres-backed credential store.
///
/// Expects a `users` table:
/// `id BIGSERIAL PRIMARY KEY, username TEXT NOT NULL UNIQUE,
///  password_hash TEXT NOT NULL, role TEXT NOT NULL,
///  created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()`
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new PgCredentialStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_user(row: UserRow) -> Result<User, AuthError> {
    User::try_from(row).map_err(AuthError::StoreError)
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_user).transpose()
    }

    async fn insert(&self, user: NewUser) -> Result<User, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) \
             RETURNING id, username, password_hash, role, created_at",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // The unique constraint is the only source of truth for duplicates
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::DuplicateIdentity { field: "username" };
                }
            }
            AuthError::StoreError(e.to_string())
        })?;

        into_user(row)
    }
}
