use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::course_detail::CourseDetailService;
use services::reorder::{ReorderCoordinator, ReorderScope};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::routes::common::reply;

/// GET /api/lessons/{lesson_id}
///
/// Returns a lesson with its content and the caller's progress.
///
/// ### Responses
/// - `200 OK`
/// - `403 Forbidden` when the lesson is locked for the caller
/// - `404 Not Found` when the lesson does not exist or is unpublished and the
///   caller is not course staff
pub async fn get_lesson(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<String>,
) -> Response {
    let result =
        CourseDetailService::lesson_detail(app_state.db(), &user.viewer(), &lesson_id).await;
    reply(result, StatusCode::OK, "Lesson retrieved successfully")
}

/// GET /api/lessons/{lesson_id}/quiz
///
/// Questions and answers in order, without correctness flags or explanations.
pub async fn get_quiz(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<String>,
) -> Response {
    let result =
        CourseDetailService::quiz_for_learner(app_state.db(), &user.viewer(), &lesson_id).await;
    reply(result, StatusCode::OK, "Quiz retrieved successfully")
}

/// GET /api/lessons/{lesson_id}/quiz/key
pub async fn get_quiz_key(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<String>,
) -> Response {
    let result = CourseDetailService::quiz_key(app_state.db(), &user.viewer(), &lesson_id).await;
    reply(result, StatusCode::OK, "Quiz retrieved successfully")
}

/// GET /api/lessons/{lesson_id}/quiz/questions/order
///
/// Learners need the same access as for opening the lesson.
pub async fn get_question_order(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<String>,
) -> Response {
    let result = ReorderCoordinator::order_for_viewer(
        app_state.db(),
        &user.viewer(),
        ReorderScope::Questions,
        &lesson_id,
    )
    .await;
    reply(result, StatusCode::OK, "Question order retrieved successfully")
}
