//! `/me` routes: the caller's own records.

use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/enrollments", get(get::list_enrollments))
}
