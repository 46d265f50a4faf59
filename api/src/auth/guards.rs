//! Route guards applied with `from_fn` / `from_fn_with_state`.
//!
//! Every guard authenticates the caller and stores the [`AuthUser`] in the
//! request extensions so handlers can pick it up with `Extension<AuthUser>`.

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;
use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::user;
use services::EngineError;
use services::access::{find_course, lesson_context, module_context};
use std::collections::HashMap;
use util::state::AppState;

#[derive(serde::Serialize, Default)]
pub struct Empty;

type GuardError = (StatusCode, Json<ApiResponse<Empty>>);

fn reject(status: StatusCode, message: impl Into<String>) -> GuardError {
    (status, Json(ApiResponse::error(message)))
}

/// Extracts and validates the caller, then puts the claims back on the request.
async fn extract_and_insert_authuser(
    mut req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), GuardError> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "Authentication required"))?;

    req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

/// Ensures the request is authenticated and that the caller has a mirror row,
/// so enrollments and progress can reference it.
pub async fn allow_authenticated(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    let claims = &user.0;

    if let Err(err) = user::Model::sync(
        app_state.db(),
        &claims.sub,
        claims.username.as_deref(),
        claims.email.as_deref(),
        claims.role,
    )
    .await
    {
        tracing::error!(error = %err, user_id = %claims.sub, "Failed to sync user record");
        return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"));
    }

    Ok(next.run(req).await)
}

/// Instructors and admins only.
pub async fn allow_instructor(req: Request<Body>, next: Next) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if !user.viewer().can_author() {
        return Err(reject(StatusCode::FORBIDDEN, "Instructor access required"));
    }

    Ok(next.run(req).await)
}

/// Staff of the course the path points at: an admin, or the instructor who
/// owns it. The course is resolved from `course_id`, `module_id` or
/// `lesson_id`, in that order.
pub async fn allow_course_staff(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    let db = app_state.db();

    let course = if let Some(course_id) = params.get("course_id") {
        find_course(db, course_id).await
    } else if let Some(module_id) = params.get("module_id") {
        module_context(db, module_id).await.map(|(_, course)| course)
    } else if let Some(lesson_id) = params.get("lesson_id") {
        lesson_context(db, lesson_id).await.map(|ctx| ctx.course)
    } else {
        return Err(reject(StatusCode::BAD_REQUEST, "Missing course, module or lesson id"));
    };

    let course = match course {
        Ok(course) => course,
        Err(EngineError::NotFound(message)) => return Err(reject(StatusCode::NOT_FOUND, message)),
        Err(err) => {
            tracing::error!(error = %err, "Failed to resolve course for staff check");
            return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"));
        }
    };

    if user.viewer().is_staff_for(&course) {
        Ok(next.run(req).await)
    } else {
        Err(reject(StatusCode::FORBIDDEN, "Course staff access required"))
    }
}
