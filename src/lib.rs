// NBA roster API with JWT bearer authentication

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod roster;
pub mod validation;

use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    authenticate, authorize, AuthGate, AuthService, AuthorizationPolicy, CredentialStore,
    TokenService,
};
use roster::RosterRepository;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::me_handler,
        auth::handlers::user_profile_handler,
        roster::handlers::list_teams,
        roster::handlers::get_team,
        roster::handlers::get_team_players,
        roster::handlers::create_team,
        roster::handlers::update_team,
        roster::handlers::delete_team,
        roster::handlers::list_players,
        roster::handlers::get_player,
        roster::handlers::create_player,
        roster::handlers::update_player,
        roster::handlers::delete_player,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::UserResponse,
            auth::Role,
            roster::Team,
            roster::CreateTeam,
            roster::UpdateTeam,
            roster::Player,
            roster::CreatePlayer,
            roster::UpdatePlayer,
            roster::Position,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and current user"),
        (name = "users", description = "User profiles"),
        (name = "teams", description = "Team management"),
        (name = "players", description = "Player management")
    ),
    info(
        title = "NBA Roster API",
        version = "1.0.0",
        description = "RESTful API for managing basketball teams and players"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers and middleware
#[derive(Clone)]
pub struct AppState {
    pub roster: RosterRepository,
    pub auth: Arc<AuthService>,
    pub gate: AuthGate,
    pub policy: Arc<AuthorizationPolicy>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        store: Arc<dyn CredentialStore>,
        tokens: Arc<TokenService>,
        policy: AuthorizationPolicy,
    ) -> Self {
        Self {
            roster: RosterRepository::new(db),
            auth: Arc::new(AuthService::new(store.clone(), tokens.clone())),
            gate: AuthGate::new(tokens, store),
            policy: Arc::new(policy),
        }
    }
}

impl FromRef<AppState> for RosterRepository {
    fn from_ref(state: &AppState) -> Self {
        state.roster.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) if origin != "*" => Some(value),
            _ => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Build the application router.
///
/// Requests pass CORS, then tracing, then the authentication gate, then the
/// authorization policy before reaching a handler.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    use auth::handlers::{login_handler, me_handler, register_handler, user_profile_handler};
    use axum::routing::post;
    use roster::handlers as roster_handlers;

    let security = ServiceBuilder::new()
        .layer(from_fn_with_state(state.gate.clone(), authenticate))
        .layer(from_fn_with_state(state.policy.clone(), authorize));

    Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/me", get(me_handler))
        .route("/api/users/:username", get(user_profile_handler))
        .route(
            "/api/teams",
            get(roster_handlers::list_teams).post(roster_handlers::create_team),
        )
        .route(
            "/api/teams/:id",
            get(roster_handlers::get_team)
                .put(roster_handlers::update_team)
                .delete(roster_handlers::delete_team),
        )
        .route("/api/teams/:id/players", get(roster_handlers::get_team_players))
        .route(
            "/api/players",
            get(roster_handlers::list_players).post(roster_handlers::create_player),
        )
        .route(
            "/api/players/:id",
            get(roster_handlers::get_player)
                .put(roster_handlers::update_player)
                .delete(roster_handlers::delete_player),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(security)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}
