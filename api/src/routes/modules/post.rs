use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::content::{ContentService, LessonInput};
use services::reorder::{ReorderCoordinator, ReorderScope};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::routes::common::{MoveRequest, reply};
use crate::routes::lessons::common::LessonResponse;

/// POST /api/modules/{module_id}/lessons
///
/// Appends a lesson at the end of the module.
///
/// ### Request Body
/// ```json
/// {
///   "title": "Check yourself",
///   "lesson_type": "QUIZ",
///   "content": {
///     "questions": [
///       { "text": "2 + 2?", "answers": [
///         { "text": "4", "is_correct": true },
///         { "text": "5", "is_correct": false }
///       ] }
///     ]
///   },
///   "is_published": true
/// }
/// ```
///
/// For non-quiz lessons `content` is a string. Quiz content is validated:
/// every question needs text and exactly one correct answer.
///
/// ### Responses
/// - `201 Created` with the new lesson
/// - `400 Bad Request` on invalid fields or quiz content
/// - `404 Not Found` when the module does not exist
pub async fn create_lesson(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(module_id): Path<String>,
    Json(req): Json<LessonInput>,
) -> Response {
    let result = ContentService::create_lesson(app_state.db(), &user.viewer(), &module_id, req)
        .await
        .map(LessonResponse::from);
    reply(result, StatusCode::CREATED, "Lesson created successfully")
}

/// POST /api/modules/{module_id}/lessons/{lesson_id}/move
pub async fn move_lesson(
    State(app_state): State<AppState>,
    Path((module_id, lesson_id)): Path<(String, String)>,
    Json(req): Json<MoveRequest>,
) -> Response {
    let result = ReorderCoordinator::move_item(
        app_state.db(),
        ReorderScope::Lessons,
        &module_id,
        &lesson_id,
        req.direction,
        req.expected_version,
    )
    .await;
    reply(result, StatusCode::OK, "Lesson moved successfully")
}
