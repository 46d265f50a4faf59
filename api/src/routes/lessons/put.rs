use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::content::{ContentService, LessonInput};
use util::state::AppState;

use super::common::LessonResponse;
use crate::auth::AuthUser;
use crate::routes::common::reply;

/// PUT /api/lessons/{lesson_id}
///
/// Replaces the lesson's fields and content. Its position is left alone.
pub async fn edit_lesson(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<String>,
    Json(req): Json<LessonInput>,
) -> Response {
    let result = ContentService::update_lesson(app_state.db(), &user.viewer(), &lesson_id, req)
        .await
        .map(LessonResponse::from);
    reply(result, StatusCode::OK, "Lesson updated successfully")
}
