//! Shared helpers for turning engine results into HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use services::EngineError;
use services::reorder::MoveDirection;

use crate::response::ApiResponse;

/// Body of every `PATCH .../order` endpoint.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// Every sibling id, in the new order.
    pub ids: Vec<String>,
    /// Parent version the client last saw. Omit to skip the staleness check.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Body of every `POST .../move` endpoint.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: MoveDirection,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

pub fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::Conflict { .. } => StatusCode::CONFLICT,
        EngineError::Database(_)
        | EngineError::Serialization(_)
        | EngineError::Reconciled { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn respond<T: Serialize>(status: StatusCode, data: T, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::success(data, message))).into_response()
}

/// Maps an engine error to its status code and envelope.
///
/// Internal failures are logged and reported with a generic message. Reorder
/// failures put the stored order in `data`.
pub fn engine_error(err: EngineError) -> Response {
    let status = status_for(&err);
    let data = err
        .current_order()
        .and_then(|order| serde_json::to_value(order).ok())
        .unwrap_or(Value::Null);

    let message = match &err {
        EngineError::Database(_) | EngineError::Serialization(_) => {
            tracing::error!(error = %err, "Request failed");
            "Internal server error".to_string()
        }
        EngineError::Reconciled { .. } => {
            tracing::error!(error = %err, "Reorder failed");
            "Reorder failed and was rolled back; data holds the current order".to_string()
        }
        other => other.to_string(),
    };

    (status, Json(ApiResponse::error_with_data(data, message))).into_response()
}

/// `Ok` becomes `status` with `message`; `Err` goes through [`engine_error`].
pub fn reply<T: Serialize>(
    result: Result<T, EngineError>,
    status: StatusCode,
    message: &str,
) -> Response {
    match result {
        Ok(data) => respond(status, data, message),
        Err(err) => engine_error(err),
    }
}
