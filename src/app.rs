use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::IdentityProvider;
use crate::config::Settings;
use crate::middleware::{make_request_span, request_id_layer, X_REQUEST_ID};
use crate::routes;
use crate::services::{StructuredExtractor, TaskStore};

/// Shared application state. Collaborators sit behind traits so routes can be
/// driven with fakes.
pub struct AppState {
    pub settings: Settings,
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn TaskStore>,
    pub ai: Arc<dyn StructuredExtractor>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn TaskStore>,
        ai: Arc<dyn StructuredExtractor>,
    ) -> Arc<Self> {
        Arc::new(Self {
            settings,
            identity,
            store,
            ai,
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(make_request_span)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let (set_request_id, propagate_request_id) = request_id_layer();
    // Oversized bodies surface as JSON rejections, answered in the error envelope
    let body_limit = DefaultBodyLimit::max(state.settings.max_request_body_bytes);

    // Applied bottom-up
    Router::new()
        .merge(routes::api_router())
        .layer(body_limit)
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let max_age = if settings.env.is_dev() {
        Duration::from_secs(86400)
    } else {
        Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(X_REQUEST_ID),
        ]))
        .expose_headers([HeaderName::from_static(X_REQUEST_ID)])
        .allow_credentials(true)
        .max_age(max_age)
}
