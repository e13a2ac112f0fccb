mod config;
mod db;
mod errors;
mod intake;
mod models;
mod notifier;
mod routes;
mod state;
mod storage;
mod store;
mod task_config;
mod tasks;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::build_blob_store;
use crate::store::{PgStore, TaskStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EduHelp API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL + migrations
    let pool = create_pool(&config.database_url).await?;
    let store: Arc<dyn TaskStore> = Arc::new(PgStore::new(pool));

    // Blob storage (one backend, chosen by STORAGE_BACKEND)
    let blobs = build_blob_store(&config).await?;

    // Downstream processor queue
    let notifier = notifier::from_settings(&config.notifier, store.clone())?;

    let state = AppState {
        store,
        blobs,
        notifier,
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the dashboard host is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
