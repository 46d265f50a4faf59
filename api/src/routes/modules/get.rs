use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::reorder::{ReorderCoordinator, ReorderScope};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::routes::common::reply;

/// GET /api/modules/{module_id}/lessons/order
///
/// Staff see every lesson. Enrolled learners see the published lessons only,
/// numbered without gaps.
pub async fn get_lesson_order(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(module_id): Path<String>,
) -> Response {
    let result = ReorderCoordinator::order_for_viewer(
        app_state.db(),
        &user.viewer(),
        ReorderScope::Lessons,
        &module_id,
    )
    .await;
    reply(result, StatusCode::OK, "Lesson order retrieved successfully")
}
