use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::Database;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use music_catalog::{
    auth::{LocalAuthClient, RedisSessionStore},
    config::Config,
    db::store::SqlDocumentStore,
    handlers,
    state::AppState,
    storage::LocalObjectStorage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "music_catalog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Music Catalog...");

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Connect to database
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    migration::Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed");

    // Connect to Redis
    let redis_client = redis::Client::open(config.redis_url.as_str())?;
    let redis_conn = redis_client
        .get_connection_manager()
        .await
        .context("Failed to connect to Redis")?;
    tracing::info!("Connected to Redis");

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("Failed to create media root {:?}", config.media_root))?;

    let state = AppState::new(
        config.clone(),
        Arc::new(SqlDocumentStore::new(db.clone())),
        Arc::new(LocalObjectStorage::new(
            config.media_root.clone(),
            config.media_base_url.clone(),
        )),
        Arc::new(LocalAuthClient::new(db)),
        Arc::new(RedisSessionStore::new(
            redis_conn,
            config.session_ttl_seconds,
        )),
    );

    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("SERVER_HOST and SERVER_PORT must form a valid socket address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState, config: &Config) -> Router {
    let media_route = if config.media_base_url.starts_with('/') {
        config.media_base_url.clone()
    } else {
        "/media".to_string()
    };

    handlers::routes()
        // Uploaded media served from the local object storage
        .nest_service(&media_route, ServeDir::new(&config.media_root))
        .nest_service("/static", ServeDir::new("static"))
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
