use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::progress::{ProgressInput, ProgressService, QuizSubmission};
use services::reorder::{ReorderCoordinator, ReorderScope};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::routes::common::{MoveRequest, reply};

/// POST /api/lessons/{lesson_id}/progress
///
/// Records an attempt for the caller. Completion is sticky: once a lesson is
/// completed, later attempts update score and time but never un-complete it.
///
/// ### Request Body
/// ```json
/// { "completed": true, "time_spent": 300, "score": 90 }
/// ```
///
/// `score` is only kept for QUIZ lessons, where a completion needs a score of
/// at least 85.
///
/// ### Responses
/// - `200 OK` with the stored progress, course progress and unlock state
/// - `400 Bad Request` on invalid fields
/// - `403 Forbidden` when not enrolled or the lesson is locked
/// - `404 Not Found` when the lesson does not exist
pub async fn record_progress(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<String>,
    Json(req): Json<ProgressInput>,
) -> Response {
    let result =
        ProgressService::record_progress(app_state.db(), &user.viewer(), &lesson_id, req).await;
    reply(result, StatusCode::OK, "Progress recorded successfully")
}

/// POST /api/lessons/{lesson_id}/quiz/submit
///
/// Grades the selections and records the attempt in one step.
///
/// ### Request Body
/// ```json
/// { "answers": { "q1": "a2", "q2": "Paris" }, "time_spent": 120 }
/// ```
///
/// Each value is an answer id or the exact answer text. Unanswered questions
/// count as wrong.
pub async fn submit_quiz(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(lesson_id): Path<String>,
    Json(req): Json<QuizSubmission>,
) -> Response {
    let result =
        ProgressService::submit_quiz(app_state.db(), &user.viewer(), &lesson_id, req).await;
    reply(result, StatusCode::OK, "Quiz graded successfully")
}

/// POST /api/lessons/{lesson_id}/quiz/questions/{question_id}/move
pub async fn move_question(
    State(app_state): State<AppState>,
    Path((lesson_id, question_id)): Path<(String, String)>,
    Json(req): Json<MoveRequest>,
) -> Response {
    let result = ReorderCoordinator::move_item(
        app_state.db(),
        ReorderScope::Questions,
        &lesson_id,
        &question_id,
        req.direction,
        req.expected_version,
    )
    .await;
    reply(result, StatusCode::OK, "Question moved successfully")
}
