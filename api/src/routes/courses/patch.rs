use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::reorder::{ReorderCoordinator, ReorderScope};
use util::state::AppState;

use crate::routes::common::{ReorderRequest, reply};

/// PATCH /api/courses/{course_id}/modules/order
///
/// Rewrites module positions to follow `ids`. The list must hold every module
/// of the course exactly once.
///
/// ### Request Body
/// ```json
/// { "ids": ["m2", "m1", "m3"], "expected_version": 4 }
/// ```
///
/// ### Responses
/// - `200 OK` with the new order and version
/// - `400 Bad Request` when `ids` repeats an id
/// - `409 Conflict` when `ids` is stale or `expected_version` is behind;
///   `data` holds the stored order
pub async fn reorder_modules(
    State(app_state): State<AppState>,
    Path(course_id): Path<String>,
    Json(req): Json<ReorderRequest>,
) -> Response {
    let result = ReorderCoordinator::apply(
        app_state.db(),
        ReorderScope::Modules,
        &course_id,
        &req.ids,
        req.expected_version,
    )
    .await;
    reply(result, StatusCode::OK, "Modules reordered successfully")
}
