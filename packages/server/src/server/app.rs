//! Application setup and router configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use openai_client::OpenAIClient;

use crate::server::routes::{health_handler, root_handler, solve_handler};

/// Outer bound on one /solve request. The model call has no timeout of its
/// own and inherits this one; the knowledge-base search carries its own 35s
/// budget per call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub openai_client: Arc<OpenAIClient>,
    pub model: String,
}

/// Build the Axum application router
pub fn build_app(openai_client: OpenAIClient, model: String) -> Router {
    let app_state = AppState {
        openai_client: Arc::new(openai_client),
        model,
    };

    // The evaluation harness calls cross-origin; allow any origin.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/solve", post(solve_handler))
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
