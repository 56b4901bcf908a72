mod auth;
mod config;
mod db;
mod errors;
mod journal;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::PgSessionAuthenticator;
use crate::config::Config;
use crate::db::create_pool;
use crate::journal::store::PgEntryStore;
use crate::llm_client::{AnswerSynthesizer, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

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

    info!("Starting Journal API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize answer synthesis; the service still boots without credentials
    let synthesizer: Option<Arc<dyn AnswerSynthesizer>> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone()).context("Failed to build LLM client")?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(llm))
        }
        None => {
            warn!("ANTHROPIC_API_KEY is not set; ask requests will fail until it is configured");
            None
        }
    };

    info!("Entry fetch limit: {}", config.entry_fetch_limit);

    // Build app state
    let state = AppState {
        config: config.clone(),
        entry_store: Arc::new(PgEntryStore::new(db.clone())),
        authenticator: Arc::new(PgSessionAuthenticator::new(db)),
        synthesizer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web app's domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
