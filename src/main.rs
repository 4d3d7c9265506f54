mod analysis;
mod api;
mod app;
mod auth;
mod config;
mod domain;
mod error;
mod logging;
mod middleware;
mod routes;
mod services;

use anyhow::Result;
use std::sync::Arc;

use services::{GeminiClient, PgTaskStore, StructuredExtractor};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = config::Settings::from_env()?;

    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        model = %settings.gemini_model,
        report_utc_offset = %settings.report_utc_offset,
        "Starting todo AI backend"
    );

    let store = PgTaskStore::connect(&settings).await?;

    let jwks_cache = auth::JwksCache::new(&settings)?;
    if let Err(e) = jwks_cache.warm_cache().await {
        tracing::warn!(error = %e, "Failed to warm JWKS cache - will fetch on first request");
    }

    let gemini = GeminiClient::new(&settings)?;

    // Non-blocking; a missing key only fails the AI routes
    tokio::spawn({
        let gemini = gemini.clone();
        async move {
            match gemini.health_check().await {
                Ok(()) => tracing::info!("AI service is reachable"),
                Err(e) => tracing::warn!(error = %e, "AI service health check failed"),
            }
        }
    });

    let state = app::AppState::new(
        settings.clone(),
        Arc::new(jwks_cache),
        Arc::new(store),
        Arc::new(gemini),
    );

    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
