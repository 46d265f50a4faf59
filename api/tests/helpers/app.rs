use api::auth::generate_jwt;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use db::models::user::UserRole;
use db::test_utils::setup_test_db;
use serde_json::Value;
use tower::ServiceExt;
use util::{config::AppConfig, state::AppState};

const TEST_SECRET: &str = "integration-test-secret";

/// Builds the full application over a fresh in-memory database.
pub async fn make_test_app() -> (Router, AppState) {
    // Loading the config fails without these two.
    unsafe {
        std::env::set_var("DATABASE_PATH", "sqlite::memory:");
        std::env::set_var("JWT_SECRET", TEST_SECRET);
    }
    AppConfig::set_jwt_secret(TEST_SECRET);

    let app_state = AppState::new(setup_test_db().await);
    (api::app(app_state.clone()), app_state)
}

pub fn token_for(user_id: &str, role: UserRole) -> String {
    let (token, _) = generate_jwt(user_id, role).unwrap();
    token
}

/// Sends one request and returns the status with the decoded envelope.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
