use axum::{Extension, extract::State, http::StatusCode, response::Response};
use services::enrollment::EnrollmentService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::routes::common::reply;

/// GET /api/me/enrollments
///
/// Courses the caller is enrolled in, oldest enrollment first, with progress
/// recomputed from their lesson records.
pub async fn list_enrollments(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    let result = EnrollmentService::list_for_user(app_state.db(), &user.0.sub).await;
    reply(result, StatusCode::OK, "Enrollments retrieved successfully")
}
