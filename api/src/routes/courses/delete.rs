use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::content::ContentService;
use services::enrollment::EnrollmentService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::routes::common::reply;

/// DELETE /api/courses/{course_id}
///
/// Deletes the course together with its modules, lessons, enrollments and
/// progress records.
pub async fn delete_course(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Response {
    let result = ContentService::delete_course(app_state.db(), &user.viewer(), &course_id).await;
    reply(result, StatusCode::OK, "Course deleted successfully")
}

/// DELETE /api/courses/{course_id}/enroll
///
/// Removes the caller's enrollment. Lesson progress is kept, so enrolling
/// again picks up where the learner left off.
pub async fn unenroll(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Response {
    let result = EnrollmentService::unenroll(app_state.db(), &user.0.sub, &course_id).await;
    reply(result, StatusCode::OK, "Unenrolled successfully")
}
