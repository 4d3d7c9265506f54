pub mod ai;
pub mod categories;
pub mod health;
pub mod me;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        .route("/categories", get(categories::list_categories))
        .route("/api/ai-parse-todo", post(ai::parse_todo))
        // Protected routes
        .route("/me", get(me::get_me))
        .route("/api/ai-summary", post(ai::summarize_todos))
}
