//! `/courses` routes.
//!
//! - `GET    /courses`                                  list courses
//! - `POST   /courses`                                  create (instructor or admin)
//! - `GET    /courses/{course_id}`                      detail with unlock state
//! - `PUT    /courses/{course_id}`                      edit (course staff)
//! - `DELETE /courses/{course_id}`                      delete with everything below it (course staff)
//! - `POST   /courses/{course_id}/enroll`               enroll, idempotent
//! - `DELETE /courses/{course_id}/enroll`               unenroll
//! - `GET    /courses/{course_id}/progress`             caller's progress
//! - `POST   /courses/{course_id}/modules`              append a module (course staff)
//! - `GET    /courses/{course_id}/modules/order`        module order (staff or enrolled)
//! - `PATCH  /courses/{course_id}/modules/order`        reorder modules (course staff)
//! - `POST   /courses/{course_id}/modules/{module_id}/move`  move one module (course staff)

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
};
use util::state::AppState;

use crate::auth::guards::{allow_course_staff, allow_instructor};

pub mod common;
pub mod delete;
pub mod get;
pub mod patch;
pub mod post;
pub mod put;

pub fn courses_routes(app_state: AppState) -> Router<AppState> {
    let staff = || from_fn_with_state(app_state.clone(), allow_course_staff);

    Router::new()
        .route(
            "/",
            get(get::list_courses)
                .merge(post(post::create_course).route_layer(from_fn(allow_instructor))),
        )
        .route(
            "/{course_id}",
            get(get::get_course).merge(
                put(put::edit_course)
                    .delete(delete::delete_course)
                    .route_layer(staff()),
            ),
        )
        .route(
            "/{course_id}/enroll",
            post(post::enroll).delete(delete::unenroll),
        )
        .route("/{course_id}/progress", get(get::get_progress))
        .route(
            "/{course_id}/modules",
            post(post::create_module).route_layer(staff()),
        )
        .route(
            "/{course_id}/modules/order",
            get(get::get_module_order).merge(patch(patch::reorder_modules).route_layer(staff())),
        )
        .route(
            "/{course_id}/modules/{module_id}/move",
            post(post::move_module).route_layer(staff()),
        )
}
