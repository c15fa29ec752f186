// crates/server/src/test_support.rs
//! Shared helpers for route tests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use focusflow_core::User;
use focusflow_db::Database;
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::{new_token, SESSION_COOKIE};
use crate::config::AuthConfig;
use crate::state::AppState;

pub async fn test_state() -> Arc<AppState> {
    let db = Database::new_in_memory().await.expect("in-memory DB");
    AppState::new(db, AuthConfig::default())
}

/// Mount one route module under `/api`, the way `api_routes` does.
pub fn build_app(state: Arc<AppState>, router: Router<Arc<AppState>>) -> Router {
    Router::new().nest("/api", router).with_state(state)
}

/// Create a user with a live session. Returns the user and a `Cookie` header value.
pub async fn signed_in(state: &AppState, email: &str) -> (User, String) {
    let user = state
        .db
        .create_user(email, "Test User", "unused-hash")
        .await
        .expect("create user");
    let token = new_token();
    state
        .db
        .create_auth_session(user.id, &token, 3600)
        .await
        .expect("create session");
    (user, format!("{SESSION_COOKIE}={token}"))
}

/// Send a request; the body is parsed as JSON (`Null` when empty).
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, _, json) = send_full(app, method, uri, cookie, body).await;
    (status, json)
}

pub async fn send_full(
    app: Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, headers, json)
}
