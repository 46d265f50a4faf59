use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::content::ContentService;
use services::course_detail::CourseDetailService;
use services::enrollment::EnrollmentService;
use services::reorder::{ReorderCoordinator, ReorderScope};
use util::state::AppState;

use super::common::CourseResponse;
use crate::auth::AuthUser;
use crate::routes::common::reply;

/// GET /api/courses
///
/// Lists every course ordered by title. Any authenticated user may browse.
pub async fn list_courses(State(app_state): State<AppState>) -> Response {
    let result = ContentService::list_courses(app_state.db())
        .await
        .map(|courses| courses.into_iter().map(CourseResponse::from).collect::<Vec<_>>());
    reply(result, StatusCode::OK, "Courses retrieved successfully")
}

/// GET /api/courses/{course_id}
///
/// Returns the course with its modules and lessons in order. For learners each
/// lesson carries `is_unlocked`, `completed` and `score`, and only published
/// lessons are listed. Learners must be enrolled.
///
/// ### Responses
/// - `200 OK` with the course tree
/// - `403 Forbidden` when a learner is not enrolled
/// - `404 Not Found` when the course does not exist
pub async fn get_course(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Response {
    let result =
        CourseDetailService::course_detail(app_state.db(), &user.viewer(), &course_id).await;
    reply(result, StatusCode::OK, "Course retrieved successfully")
}

/// GET /api/courses/{course_id}/progress
pub async fn get_progress(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Response {
    let result =
        EnrollmentService::course_progress(app_state.db(), &user.viewer(), &course_id).await;
    reply(result, StatusCode::OK, "Progress retrieved successfully")
}

/// GET /api/courses/{course_id}/modules/order
///
/// Returns the module order and the version to send back with a reorder
/// request. Learners must be enrolled.
///
/// ### Responses
/// - `200 OK` with the order snapshot
/// - `403 Forbidden` when a learner is not enrolled
/// - `404 Not Found` when the course does not exist
pub async fn get_module_order(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Response {
    let result = ReorderCoordinator::order_for_viewer(
        app_state.db(),
        &user.viewer(),
        ReorderScope::Modules,
        &course_id,
    )
    .await;
    reply(result, StatusCode::OK, "Module order retrieved successfully")
}
