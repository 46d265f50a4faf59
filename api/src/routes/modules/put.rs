use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use services::content::{ContentService, ModuleInput};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::routes::common::reply;
use crate::routes::courses::common::ModuleResponse;

/// PUT /api/modules/{module_id}
pub async fn edit_module(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(module_id): Path<String>,
    Json(req): Json<ModuleInput>,
) -> Response {
    let result = ContentService::update_module(app_state.db(), &user.viewer(), &module_id, req)
        .await
        .map(ModuleResponse::from);
    reply(result, StatusCode::OK, "Module updated successfully")
}
