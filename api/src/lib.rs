pub mod auth;
pub mod response;
pub mod routes;

use std::time::Duration;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use util::{config, state::AppState};

/// Builds the full HTTP application: every route under `/api`, a per-request
/// timeout and permissive CORS.
///
/// Request logging needs the peer address, so the binary adds it on top.
pub fn app(app_state: AppState) -> Router {
    let timeout = Duration::from_millis(config::request_timeout_ms());
    let cors = CorsLayer::very_permissive().expose_headers([CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::routes(app_state))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
}
