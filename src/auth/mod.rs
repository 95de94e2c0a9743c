// Authentication module
// Provides JWT bearer authentication, role-based route authorization,
// and user registration/login

pub mod error;
pub mod handlers;
pub mod memory;
pub mod middleware;
pub mod models;
pub mod password;
pub mod policy;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::{AuthError, TokenError};
pub use handlers::{login_handler, me_handler, register_handler, user_profile_handler};
pub use memory::InMemoryCredentialStore;
pub use middleware::{authenticate, AuthGate, AuthenticatedUser, Principal};
pub use models::{
    AuthResponse, Credential, LoginRequest, NewUser, RegisterRequest, Role, User, UserResponse,
};
pub use password::PasswordService;
pub use policy::{authorize, AccessRule, AuthorizationPolicy};
pub use repository::{CredentialStore, PgCredentialStore};
pub use service::AuthService;
pub use token::{Claims, TokenService, TOKEN_TTL_SECONDS};
