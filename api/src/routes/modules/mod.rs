//! `/modules` routes. Every write needs course staff, resolved through the
//! module's course.
//!
//! - `PUT    /modules/{module_id}`
//! - `DELETE /modules/{module_id}`
//! - `POST   /modules/{module_id}/lessons`
//! - `GET    /modules/{module_id}/lessons/order`
//! - `PATCH  /modules/{module_id}/lessons/order`
//! - `POST   /modules/{module_id}/lessons/{lesson_id}/move`

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
};
use util::state::AppState;

use crate::auth::guards::allow_course_staff;

pub mod delete;
pub mod get;
pub mod patch;
pub mod post;
pub mod put;

pub fn modules_routes(app_state: AppState) -> Router<AppState> {
    let staff = || from_fn_with_state(app_state.clone(), allow_course_staff);

    Router::new()
        .route(
            "/{module_id}",
            put(put::edit_module)
                .delete(delete::delete_module)
                .route_layer(staff()),
        )
        .route(
            "/{module_id}/lessons",
            post(post::create_lesson).route_layer(staff()),
        )
        .route(
            "/{module_id}/lessons/order",
            get(get::get_lesson_order).merge(patch(patch::reorder_lessons).route_layer(staff())),
        )
        .route(
            "/{module_id}/lessons/{lesson_id}/move",
            post(post::move_lesson).route_layer(staff()),
        )
}
