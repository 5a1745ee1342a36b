/// Shared helpers for API integration tests
///
/// Builds the full router over the in-memory store so tests exercise the
/// HTTP surface end to end without a running database.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tackboard_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig},
};
use tackboard_shared::store::MemoryStore;
use tower::Service as _;

/// Configuration used by the test server
pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 4000,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://localhost/unused".to_string(),
            max_connections: 5,
        },
        jwt: JwtConfig {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
        },
    }
}

/// Builds a router backed by a fresh in-memory store
pub fn test_app() -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()), test_config());
    build_router(state)
}

/// Sends one request and decodes the JSON response body
pub async fn request(
    app: &mut Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("Failed to build request"),
        None => builder
            .body(Body::empty())
            .expect("Failed to build request"),
    };

    let response = app.call(request).await.expect("Failed to send request");
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body is not JSON")
    };

    (status, json)
}

/// Registers a user and returns their id and access token
pub async fn register(app: &mut Router, name: &str, email: &str) -> (String, String) {
    let (status, body) = request(
        app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": "a-long-enough-password",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let user_id = body["user"]["id"]
        .as_str()
        .expect("Missing user id")
        .to_string();
    let token = body["access_token"]
        .as_str()
        .expect("Missing access token")
        .to_string();

    (user_id, token)
}

/// Creates a board and returns its id
pub async fn create_board(app: &mut Router, token: &str, name: &str) -> String {
    let (status, body) = request(
        app,
        Method::POST,
        "/v1/boards",
        Some(token),
        Some(serde_json::json!({ "name": name })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "create board failed: {}", body);

    body["board"]["id"]
        .as_str()
        .expect("Missing board id")
        .to_string()
}
