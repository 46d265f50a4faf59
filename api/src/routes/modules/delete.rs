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

/// DELETE /api/modules/{module_id}
///
/// Deletes the module and its lessons. The remaining modules are renumbered
/// so positions stay 1..n.
pub async fn delete_module(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(module_id): Path<String>,
) -> Response {
    let result = ContentService::delete_module(app_state.db(), &user.viewer(), &module_id).await;
    reply(result, StatusCode::OK, "Module deleted successfully")
}
