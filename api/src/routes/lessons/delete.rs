use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::content::ContentService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::routes::common::reply;

/// DELETE /api/lessons/{lesson_id}
pub async fn delete_lesson(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<String>,
) -> Response {
    let result = ContentService::delete_lesson(app_state.db(), &user.viewer(), &lesson_id).await;
    reply(result, StatusCode::OK, "Lesson deleted successfully")
}
