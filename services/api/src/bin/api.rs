//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{AnthropicCompletionAdapter, FileStore, PgKvStore},
    config::Config,
    error::ApiError,
    web::{self, state::AppState},
};
use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use support_chat_core::{KeyValueStore, SlotStore};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Key-Value Store ---
    let kv: Arc<dyn KeyValueStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let pg_store = PgKvStore::new(db_pool);
            info!("Running database migrations...");
            pg_store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(pg_store)
        }
        None => {
            info!("Storing collections under {}", config.data_dir.display());
            Arc::new(FileStore::open(&config.data_dir).await?)
        }
    };
    let store = SlotStore::new(kv);

    // --- 3. Initialize the Completion Adapter ---
    if config.anthropic_api_key.is_none() {
        warn!("ANTHROPIC_API_KEY is not set; requests are sent without auth headers");
    }
    if config.completion_timeout.is_none() {
        info!("No completion timeout configured; requests wait until the service replies");
    }
    let completion = Arc::new(AnthropicCompletionAdapter::new(
        config.completion_base_url.clone(),
        config.anthropic_api_key.clone(),
        config.completion_timeout,
    )?);

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), store, completion).await);

    let allowed_origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let app = web::router(app_state).layer(cors);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
