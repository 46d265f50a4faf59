use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::reorder::{ReorderCoordinator, ReorderScope};
use util::state::AppState;

use crate::routes::common::{ReorderRequest, reply};

/// PATCH /api/lessons/{lesson_id}/quiz/questions/order
pub async fn reorder_questions(
    State(app_state): State<AppState>,
    Path(lesson_id): Path<String>,
    Json(req): Json<ReorderRequest>,
) -> Response {
    let result = ReorderCoordinator::apply(
        app_state.db(),
        ReorderScope::Questions,
        &lesson_id,
        &req.ids,
        req.expected_version,
    )
    .await;
    reply(result, StatusCode::OK, "Questions reordered successfully")
}
