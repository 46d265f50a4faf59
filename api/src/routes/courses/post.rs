use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::content::{ContentService, CourseInput, ModuleInput};
use services::enrollment::{EnrollOutcome, EnrollmentService};
use services::reorder::{ReorderCoordinator, ReorderScope};
use util::state::AppState;

use super::common::{CourseResponse, EnrollmentResponse, ModuleResponse};
use crate::auth::AuthUser;
use crate::routes::common::{MoveRequest, engine_error, reply, respond};

/// POST /api/courses
///
/// Creates a course owned by the caller.
///
/// ### Request Body
/// ```json
/// {
///   "title": "Rust for Beginners",
///   "description": "Ownership, borrowing and the rest",
///   "duration": 120,
///   "level": "beginner",
///   "tags": ["rust", "systems"]
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the new course
/// - `400 Bad Request` when a field fails validation
/// - `403 Forbidden` when the caller is a student
pub async fn create_course(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CourseInput>,
) -> Response {
    let result = ContentService::create_course(app_state.db(), &user.viewer(), req)
        .await
        .map(CourseResponse::from);
    reply(result, StatusCode::CREATED, "Course created successfully")
}

/// POST /api/courses/{course_id}/enroll
///
/// Enrolls the caller. Repeating the call is harmless: the existing
/// enrollment comes back with `status: "already_enrolled"` and `200 OK`.
///
/// ### Responses
/// - `201 Created` with `status: "created"` on a new enrollment
/// - `200 OK` with `status: "already_enrolled"`
/// - `404 Not Found` when the course does not exist
pub async fn enroll(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Response {
    match EnrollmentService::enroll(app_state.db(), &user.0.sub, &course_id).await {
        Ok((row, outcome @ EnrollOutcome::Created)) => respond(
            StatusCode::CREATED,
            EnrollmentResponse::new(row, outcome),
            "Enrolled successfully",
        ),
        Ok((row, outcome @ EnrollOutcome::AlreadyEnrolled)) => respond(
            StatusCode::OK,
            EnrollmentResponse::new(row, outcome),
            "Already enrolled",
        ),
        Err(err) => engine_error(err),
    }
}

/// POST /api/courses/{course_id}/modules
///
/// Appends a module at the end of the course.
pub async fn create_module(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
    Json(req): Json<ModuleInput>,
) -> Response {
    let result = ContentService::create_module(app_state.db(), &user.viewer(), &course_id, req)
        .await
        .map(ModuleResponse::from);
    reply(result, StatusCode::CREATED, "Module created successfully")
}

/// POST /api/courses/{course_id}/modules/{module_id}/move
///
/// Swaps a module with its neighbour. Moving the first module up or the last
/// one down leaves the order as it is.
pub async fn move_module(
    State(app_state): State<AppState>,
    Path((course_id, module_id)): Path<(String, String)>,
    Json(req): Json<MoveRequest>,
) -> Response {
    let result = ReorderCoordinator::move_item(
        app_state.db(),
        ReorderScope::Modules,
        &course_id,
        &module_id,
        req.direction,
        req.expected_version,
    )
    .await;
    reply(result, StatusCode::OK, "Module moved successfully")
}
