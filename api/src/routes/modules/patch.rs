use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::reorder::{ReorderCoordinator, ReorderScope};
use util::state::AppState;

use crate::routes::common::{ReorderRequest, reply};

/// PATCH /api/modules/{module_id}/lessons/order
///
/// Same contract as the module reorder: `ids` must name every lesson of the
/// module once, and a conflict returns the stored order in `data`.
pub async fn reorder_lessons(
    State(app_state): State<AppState>,
    Path(module_id): Path<String>,
    Json(req): Json<ReorderRequest>,
) -> Response {
    let result = ReorderCoordinator::apply(
        app_state.db(),
        ReorderScope::Lessons,
        &module_id,
        &req.ids,
        req.expected_version,
    )
    .await;
    reply(result, StatusCode::OK, "Lessons reordered successfully")
}
