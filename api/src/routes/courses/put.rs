use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::content::{ContentService, CourseInput};
use util::state::AppState;

use super::common::CourseResponse;
use crate::auth::AuthUser;
use crate::routes::common::reply;

/// PUT /api/courses/{course_id}
///
/// Replaces the editable fields of a course. The owner and the module order
/// are left alone.
pub async fn edit_course(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(course_id): Path<String>,
    Json(req): Json<CourseInput>,
) -> Response {
    let result = ContentService::update_course(app_state.db(), &user.viewer(), &course_id, req)
        .await
        .map(CourseResponse::from);
    reply(result, StatusCode::OK, "Course updated successfully")
}
