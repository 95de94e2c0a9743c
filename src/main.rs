use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use nba_api::{
    auth::{AuthorizationPolicy, CredentialStore, PgCredentialStore, TokenService},
    config::AppConfig,
    create_router, db, AppState,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("NBA API - Starting...");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        "Token signing key loaded (fingerprint {})",
        config.signing_key.fingerprint()
    );

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool.clone()));
    let tokens = Arc::new(TokenService::new(config.signing_key.clone()));
    let policy = AuthorizationPolicy::for_application()?;
    let state = AppState::new(pool, store, tokens, policy);

    if let Some(admin) = &config.admin {
        state
            .auth
            .bootstrap_admin(&admin.username, &admin.password)
            .await?;
    }

    let app = create_router(state, &config.cors_origins);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("NBA API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
