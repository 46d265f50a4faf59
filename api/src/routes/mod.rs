//! HTTP routes under `/api`.
//!
//! - `/health` is public.
//! - `/courses`, `/modules`, `/lessons` and `/me` require a valid token.
//!   Writes to course content additionally require course staff (the owning
//!   instructor or an admin).

use crate::auth::guards::allow_authenticated;
use crate::routes::{
    courses::courses_routes, health::health_routes, lessons::lessons_routes, me::me_routes,
    modules::modules_routes,
};
use axum::{Router, middleware::from_fn_with_state};
use util::state::AppState;

pub mod common;
pub mod courses;
pub mod health;
pub mod lessons;
pub mod me;
pub mod modules;

/// Builds every `/api` route with its guards and binds the shared state.
pub fn routes(app_state: AppState) -> Router {
    let authenticated = || from_fn_with_state(app_state.clone(), allow_authenticated);

    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/courses",
            courses_routes(app_state.clone()).route_layer(authenticated()),
        )
        .nest(
            "/modules",
            modules_routes(app_state.clone()).route_layer(authenticated()),
        )
        .nest(
            "/lessons",
            lessons_routes(app_state.clone()).route_layer(authenticated()),
        )
        .nest("/me", me_routes().route_layer(authenticated()))
        .with_state(app_state.clone())
}
