// crates/server/src/routes/auth.rs
//! Account signup, login and logout.
//!
//! - POST /auth/signup  - Create an account (code required except for the first account under open signup)
//! - POST /auth/login   - Exchange email/password for a session cookie
//! - POST /auth/logout  - Revoke the current session
//! - GET  /auth/me      - The signed-in user

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use focusflow_core::{validate, User, ValidationError};
use focusflow_db::SignupOutcome;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::auth::{
    check_password, clear_cookie, hash_password_blocking, new_token, session_cookie, CurrentUser,
    SESSION_COOKIE,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    #[serde(default)]
    pub registration_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by signup and login. `token` is the same value as the cookie,
/// for clients that authenticate with a bearer header.
#[derive(Debug, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

type SessionResponse = ([(header::HeaderName, String); 1], Json<AuthResponse>);

async fn start_session(state: &AppState, user: User) -> ApiResult<SessionResponse> {
    let token = new_token();
    let ttl = state.auth.session_ttl_secs();
    state.db.create_auth_session(user.id, &token, ttl).await?;
    let cookie = session_cookie(SESSION_COOKIE, &token, ttl, state.auth.secure_cookies);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse { user, token }),
    ))
}

/// POST /api/auth/signup
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = validate::email(&body.email)?;
    let display_name = validate::title("displayName", &body.display_name)?;
    validate::password(&body.password)?;

    let code = match body.registration_code.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(validate::registration_code(raw)?),
        _ if state.auth.open_signup => None,
        _ => {
            return Err(ValidationError::new("registrationCode", "is required").into())
        }
    };

    let hash = hash_password_blocking(body.password).await?;
    let now = chrono::Utc::now().timestamp();
    let outcome = state
        .db
        .create_user_with_code(&email, &display_name, &hash, code.as_deref(), now)
        .await?;

    let user = match outcome {
        SignupOutcome::Created(user) => user,
        SignupOutcome::InvalidCode => {
            return Err(ApiError::BadRequest(
                "Invalid or expired registration code".into(),
            ))
        }
        SignupOutcome::CodeExhausted => {
            return Err(ApiError::Conflict(
                "Registration code has no uses left".into(),
            ))
        }
        SignupOutcome::EmailTaken => {
            return Err(ApiError::Conflict("email already exists".into()))
        }
        SignupOutcome::CodeRequired => {
            return Err(ValidationError::new("registrationCode", "is required").into())
        }
    };

    tracing::info!(user_id = user.id, "User signed up");
    let session = start_session(&state, user).await?;
    Ok((StatusCode::CREATED, session))
}

/// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = body.email.trim().to_lowercase();
    let (user, hash) = state.db.user_credentials(&email).await?.unzip();
    let valid = check_password(body.password, hash).await?;
    let user = user
        .filter(|_| valid)
        .ok_or(ApiError::Unauthorized("Invalid email or password"))?;
    if user.disabled {
        return Err(ApiError::Forbidden("Account disabled"));
    }

    tracing::info!(user_id = user.id, "User logged in");
    start_session(&state, user).await
}

/// POST /api/auth/logout
async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    state.db.delete_auth_session(&current.token).await?;
    Ok((
        StatusCode::NO_CONTENT,
        [(
            header::SET_COOKIE,
            clear_cookie(SESSION_COOKIE, state.auth.secure_cookies),
        )],
    ))
}

/// GET /api/auth/me
async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::test_support::{build_app, send, send_full};
    use axum::http::Method;
    use focusflow_db::Database;
    use serde_json::json;

    async fn state_with(open_signup: bool) -> Arc<AppState> {
        let db = Database::new_in_memory().await.unwrap();
        AppState::new(
            db,
            AuthConfig {
                open_signup,
                ..AuthConfig::default()
            },
        )
    }

    fn signup_body(email: &str, code: Option<&str>) -> serde_json::Value {
        json!({
            "email": email,
            "displayName": "Grace",
            "password": "hunter2hunter2",
            "registrationCode": code,
        })
    }

    fn cookie_pair(headers: &axum::http::HeaderMap) -> String {
        let set = headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set.split(';').next().unwrap().to_string()
    }

    // ========================================================================
    // Signup
    // ========================================================================

    #[tokio::test]
    async fn test_signup_requires_code_unless_open() {
        let state = state_with(false).await;
        let app = build_app(state.clone(), router());
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("g@example.com", None)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().starts_with("registrationCode"));
        assert_eq!(state.db.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_signup_open_sets_cookie() {
        let state = state_with(true).await;
        let app = build_app(state.clone(), router());
        let (status, headers, body) = send_full(
            app.clone(),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("  G@Example.com ", None)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "g@example.com");
        assert_eq!(body["user"]["plan"], "free");

        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));

        let cookie = cookie_pair(&headers);
        let (status, me) = send(app, Method::GET, "/api/auth/me", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["displayName"], "Grace");
    }

    #[tokio::test]
    async fn test_signup_with_code_consumes_it() {
        let state = state_with(false).await;
        state
            .db
            .create_registration_code("WELCOME-1", 1, None, None)
            .await
            .unwrap();
        let app = build_app(state.clone(), router());

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("a@example.com", Some("WELCOME-1"))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("b@example.com", Some("WELCOME-1"))),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["details"].as_str().unwrap().contains("no uses left"));

        let (status, _) = send(
            app,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("c@example.com", Some("NOPE-NOPE"))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_open_signup_admits_only_first_account() {
        let state = state_with(true).await;
        let app = build_app(state.clone(), router());
        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("a@example.com", None)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("b@example.com", None)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().starts_with("registrationCode"));
        assert_eq!(state.db.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_conflicts() {
        let state = state_with(true).await;
        state
            .db
            .create_registration_code("SECOND-IN", 5, None, None)
            .await
            .unwrap();
        let app = build_app(state, router());
        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("dup@example.com", None)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(
            app,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("dup@example.com", Some("SECOND-IN"))),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let state = state_with(true).await;
        let app = build_app(state, router());
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({"email": "x@example.com", "displayName": "X", "password": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().starts_with("password"));
    }

    // ========================================================================
    // Login / logout
    // ========================================================================

    #[tokio::test]
    async fn test_login_logout_flow() {
        let state = state_with(true).await;
        let app = build_app(state.clone(), router());
        send(
            app.clone(),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("l@example.com", None)),
        )
        .await;

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "l@example.com", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": "hunter2hunter2"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid email or password");

        let (status, headers, body) = send_full(
            app.clone(),
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "L@example.com", "password": "hunter2hunter2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let cookie = cookie_pair(&headers);
        assert_eq!(cookie, format!("{SESSION_COOKIE}={}", body["token"].as_str().unwrap()));

        let (status, headers, _) =
            send_full(app.clone(), Method::POST, "/api/auth/logout", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));

        let (status, _) = send(app, Method::GET, "/api/auth/me", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_disabled_account_forbidden() {
        let state = state_with(true).await;
        let app = build_app(state.clone(), router());
        let (_, body) = send(
            app.clone(),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("off@example.com", None)),
        )
        .await;
        let id = body["user"]["id"].as_i64().unwrap();
        state.db.set_user_disabled(id, true).await.unwrap();

        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "off@example.com", "password": "hunter2hunter2"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Account disabled");
    }

    #[tokio::test]
    async fn test_me_accepts_bearer_token() {
        let state = state_with(true).await;
        let app = build_app(state, router());
        let (_, body) = send(
            app.clone(),
            Method::POST,
            "/api/auth/signup",
            None,
            Some(signup_body("b@example.com", None)),
        )
        .await;
        let token = body["token"].as_str().unwrap();

        let response = tower::ServiceExt::oneshot(
            app,
            axum::http::Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_me_without_session_is_401() {
        let state = state_with(false).await;
        let app = build_app(state, router());
        let (status, body) = send(app, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Not signed in");
    }
}
