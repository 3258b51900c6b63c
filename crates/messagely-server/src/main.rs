mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use messagely_api::{AppState, AppStateInner, Hasher, TokenIssuer, UserDirectory};
use messagely_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "messagely=debug,messagely_api=debug,messagely_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_placeholder_secret() {
        warn!("MESSAGELY_JWT_SECRET is unset or a placeholder; tokens are forgeable");
    }

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    // Shared state
    let hasher = Hasher::with_cost(
        config.hash_memory_kib,
        config.hash_iterations,
        config.hash_parallelism,
    )?;
    let state: AppState = Arc::new(AppStateInner {
        directory: UserDirectory::new(db, hasher),
        tokens: TokenIssuer::new(&config.jwt_secret, chrono::Duration::days(config.token_ttl_days)),
    });

    let app = messagely_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Messagely server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
