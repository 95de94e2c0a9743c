// Authentication gate: resolves the bearer token into a request-scoped identity

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::auth::{
    error::AuthError, models::Role, repository::CredentialStore, token::TokenService,
};

const BEARER_PREFIX: &str = "Bearer ";

/// Identity bound to a request after a successful token check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role.as_str())
    }
}

/// Per-request authentication filter.
///
/// Never rejects a request: it either binds a `Principal` into the request
/// extensions or leaves the request anonymous. Rejection is the job of the
/// authorization policy.
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
    store: Arc<dyn CredentialStore>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn CredentialStore>) -> Self {
        Self { tokens, store }
    }

    /// Resolve request headers into a principal, or `None` for anonymous
    pub async fn resolve(&self, headers: &HeaderMap) -> Option<Principal> {
        let token = match bearer_token(headers) {
            Some(token) => token,
            None => {
                debug!("No bearer token, continuing anonymously");
                return None;
            }
        };

        let claims = match self.tokens.validate(token, None) {
            Ok(claims) => claims,
            Err(e) => {
                // The kind stays in the logs; callers only see "unauthenticated"
                warn!("Rejected bearer token: {}", e);
                return None;
            }
        };

        match self.store.find_by_username(&claims.sub).await {
            Ok(Some(_)) => {
                debug!("Authenticated '{}'", claims.sub);
                Some(Principal {
                    username: claims.sub,
                    roles: claims.roles,
                })
            }
            Ok(None) => {
                warn!("Token subject '{}' no longer exists", claims.sub);
                None
            }
            Err(e) => {
                error!("Identity lookup failed during authentication: {}", e);
                None
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}

/// Middleware entry point for the authentication gate
pub async fn authenticate(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    // A client-supplied principal must never survive into the pipeline
    request.extensions_mut().remove::<Principal>();

    if let Some(principal) = gate.resolve(request.headers()).await {
        request.extensions_mut().insert(principal);
    }

    next.run(request).await
}

/// Authenticated user extractor for handlers behind the gate
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        memory::InMemoryCredentialStore,
        models::NewUser,
    };
    use crate::config::SigningKey;
    use axum::{
        http::{HeaderValue, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Json, Router,
    };
    use axum_test::TestServer;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"test_secret_key_for_testing_purposes";

    fn roles(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    async fn setup() -> (Arc<InMemoryCredentialStore>, Arc<TokenService>, AuthGate) {
        let store = Arc::new(InMemoryCredentialStore::new());
        store
            .insert(NewUser {
                username: "alice".to_string(),
                password_hash: "unused".to_string(),
                role: Role::User,
            })
            .await
            .unwrap();

        let tokens = Arc::new(TokenService::new(SigningKey::new(SECRET.to_vec()).unwrap()));
        let gate = AuthGate::new(tokens.clone(), store.clone());
        (store, tokens, gate)
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    // Reports what the gate left behind for downstream stages
    async fn whoami(user: Option<AuthenticatedUser>) -> Json<serde_json::Value> {
        match user {
            Some(AuthenticatedUser(principal)) => Json(json!({
                "username": principal.username,
                "roles": principal.roles,
            })),
            None => Json(json!({ "username": null })),
        }
    }

    fn gate_server(gate: AuthGate) -> TestServer {
        let app = Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn_with_state(gate, authenticate));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_binds_principal() {
        let (_, tokens, gate) = setup().await;
        let token = tokens.issue("alice", &roles(&["USER"])).unwrap();

        let principal = gate.resolve(&headers_with(&format!("Bearer {}", token))).await;

        assert_eq!(
            principal,
            Some(Principal {
                username: "alice".to_string(),
                roles: roles(&["USER"]),
            })
        );
        assert!(principal.unwrap().has_role(Role::User));
    }

    #[tokio::test]
    async fn test_missing_header_is_anonymous() {
        let (_, _, gate) = setup().await;
        assert_eq!(gate.resolve(&HeaderMap::new()).await, None);
    }

    #[tokio::test]
    async fn test_non_bearer_schemes_are_anonymous() {
        let (_, tokens, gate) = setup().await;
        let token = tokens.issue("alice", &roles(&["USER"])).unwrap();

        for value in [
            token.clone(),
            format!("bearer {}", token),
            format!("Token {}", token),
            "Basic dXNlcjpwYXNz".to_string(),
            "Bearer".to_string(),
            "Bearer ".to_string(),
        ] {
            assert_eq!(gate.resolve(&headers_with(&value)).await, None, "{}", value);
        }
    }

    #[tokio::test]
    async fn test_invalid_tokens_are_anonymous() {
        let (_, _, gate) = setup().await;

        let other_key = TokenService::new(SigningKey::new(vec![3u8; 32]).unwrap());
        let foreign = other_key.issue("alice", &roles(&["ADMIN"])).unwrap();

        for token in ["garbage", "a.b.c", foreign.as_str()] {
            let headers = headers_with(&format!("Bearer {}", token));
            assert_eq!(gate.resolve(&headers).await, None);
        }
    }

    #[tokio::test]
    async fn test_expired_token_is_anonymous() {
        let (_, _, gate) = setup().await;

        let now = Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &json!({ "sub": "alice", "roles": ["USER"], "iat": now - 40_000, "exp": now - 4_000 }),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let headers = headers_with(&format!("Bearer {}", token));
        assert_eq!(gate.resolve(&headers).await, None);
    }

    #[tokio::test]
    async fn test_deleted_account_is_anonymous() {
        let (store, tokens, gate) = setup().await;
        let token = tokens.issue("alice", &roles(&["USER"])).unwrap();
        let headers = headers_with(&format!("Bearer {}", token));

        assert!(gate.resolve(&headers).await.is_some());
        store.remove("alice").await;
        assert_eq!(gate.resolve(&headers).await, None);
    }

    #[tokio::test]
    async fn test_roles_come_from_claims() {
        let (_, tokens, gate) = setup().await;
        // alice is stored as USER, but the token was issued with ADMIN
        let token = tokens.issue("alice", &roles(&["ADMIN"])).unwrap();

        let principal = gate
            .resolve(&headers_with(&format!("Bearer {}", token)))
            .await
            .unwrap();
        assert!(principal.has_role(Role::Admin));
        assert!(!principal.has_role(Role::User));
    }

    #[tokio::test]
    async fn test_gate_forwards_every_request() {
        let (_, tokens, gate) = setup().await;
        let server = gate_server(gate);

        let anonymous = server.get("/whoami").await;
        assert_eq!(anonymous.status_code(), StatusCode::OK);
        assert_eq!(anonymous.json::<serde_json::Value>()["username"], serde_json::Value::Null);

        let invalid = server
            .get("/whoami")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"))
            .await;
        assert_eq!(invalid.status_code(), StatusCode::OK);
        assert_eq!(invalid.json::<serde_json::Value>()["username"], serde_json::Value::Null);

        let token = tokens.issue("alice", &roles(&["USER"])).unwrap();
        let valid = server
            .get("/whoami")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            )
            .await;
        assert_eq!(valid.status_code(), StatusCode::OK);
        let body = valid.json::<serde_json::Value>();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["roles"], json!(["USER"]));
    }

    #[tokio::test]
    async fn test_extractor_rejects_anonymous() {
        let mut parts = axum::http::Request::builder()
            .uri("/")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = AuthenticatedUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }
}
