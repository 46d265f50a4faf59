//! `/lessons` routes.
//!
//! - `GET    /lessons/{lesson_id}`                      lesson with content, if unlocked
//! - `PUT    /lessons/{lesson_id}`                      edit (course staff)
//! - `DELETE /lessons/{lesson_id}`                      delete (course staff)
//! - `GET    /lessons/{lesson_id}/quiz`                 quiz without answer keys
//! - `GET    /lessons/{lesson_id}/quiz/key`             full quiz (course staff)
//! - `POST   /lessons/{lesson_id}/quiz/submit`          grade and record an attempt
//! - `GET    /lessons/{lesson_id}/quiz/questions/order` question order (anyone who can open the lesson)
//! - `PATCH  /lessons/{lesson_id}/quiz/questions/order` reorder questions (course staff)
//! - `POST   /lessons/{lesson_id}/quiz/questions/{question_id}/move` (course staff)
//! - `POST   /lessons/{lesson_id}/progress`             record progress

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
};
use util::state::AppState;

use crate::auth::guards::allow_course_staff;

pub mod common;
pub mod delete;
pub mod get;
pub mod patch;
pub mod post;
pub mod put;

pub fn lessons_routes(app_state: AppState) -> Router<AppState> {
    let staff = || from_fn_with_state(app_state.clone(), allow_course_staff);

    Router::new()
        .route(
            "/{lesson_id}",
            get(get::get_lesson).merge(
                put(put::edit_lesson)
                    .delete(delete::delete_lesson)
                    .route_layer(staff()),
            ),
        )
        .route("/{lesson_id}/quiz", get(get::get_quiz))
        .route(
            "/{lesson_id}/quiz/key",
            get(get::get_quiz_key).route_layer(staff()),
        )
        .route("/{lesson_id}/quiz/submit", post(post::submit_quiz))
        .route(
            "/{lesson_id}/quiz/questions/order",
            get(get::get_question_order)
                .merge(patch(patch::reorder_questions).route_layer(staff())),
        )
        .route(
            "/{lesson_id}/quiz/questions/{question_id}/move",
            post(post::move_question).route_layer(staff()),
        )
        .route("/{lesson_id}/progress", post(post::record_progress))
}
