// In-process credential store

use axum::async_trait;
use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::auth::{
    error::AuthError,
    models::{NewUser, User},
    repository::CredentialStore,
};

/// Credential store kept in memory. Uniqueness is enforced under the write
/// lock, so concurrent inserts of one username yield exactly one winner.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
    next_id: AtomicI64,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete an account. Returns whether it existed.
    pub async fn remove(&self, username: &str) -> bool {
        self.users.write().await.remove(username).is_some()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, AuthError> {
        let mut users = self.users.write().await;

        match users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(AuthError::DuplicateIdentity { field: "username" }),
            Entry::Vacant(slot) => {
                let stored = User {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
                    username: user.username,
                    password_hash: user.password_hash,
                    role: user.role,
                    created_at: Utc::now(),
                };
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }
}
