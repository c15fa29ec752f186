// crates/server/src/routes/admin.rs
//! Admin console API. Every route except login requires the admin cookie.
//!
//! - POST   /admin/login
//! - POST   /admin/logout
//! - GET    /admin/overview
//! - GET    /admin/users?limit=&offset=
//! - PATCH  /admin/users/{id}     `{ plan?, disabled? }`
//! - DELETE /admin/users/{id}
//! - GET    /admin/tasks?limit=&offset=
//! - DELETE /admin/tasks/{id}
//! - GET    /admin/codes
//! - POST   /admin/codes          `{ code?, maxUses, expiresAt? }`
//! - DELETE /admin/codes/{id}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use focusflow_core::{validate, AdminUser, Plan, RegistrationCode, Task, User, ValidationError};
use focusflow_db::{AdminOverview, UserOverview};
use serde::Deserialize;

use crate::auth::{
    check_password, clear_cookie, new_token, session_cookie, CurrentAdmin, ADMIN_COOKIE,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_PAGE: i64 = 50;
const MAX_PAGE: i64 = 200;
const MAX_CODE_USES: i64 = 10_000;

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    fn bounds(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub plan: Option<Plan>,
    pub disabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCodeRequest {
    /// Generated when omitted.
    pub code: Option<String>,
    #[serde(default = "default_max_uses")]
    pub max_uses: i64,
    pub expires_at: Option<i64>,
}

fn default_max_uses() -> i64 {
    1
}

fn generate_code() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("FF-{}", raw[..10].to_ascii_uppercase())
}

// ============================================================================
// Session
// ============================================================================

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AdminLoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (admin, hash) = state
        .db
        .get_admin_by_username(body.username.trim())
        .await?
        .unzip();
    let valid = check_password(body.password, hash).await?;
    let admin = admin
        .filter(|_| valid)
        .ok_or(ApiError::Unauthorized("Invalid username or password"))?;

    let token = new_token();
    let ttl = state.auth.session_ttl_secs();
    state.db.create_admin_session(admin.id, &token, ttl).await?;
    tracing::info!(admin = %admin.username, "Admin logged in");
    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(ADMIN_COOKIE, &token, ttl, state.auth.secure_cookies),
        )],
        Json(admin),
    ))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentAdmin,
) -> ApiResult<impl IntoResponse> {
    state.db.delete_admin_session(&current.token).await?;
    Ok((
        StatusCode::NO_CONTENT,
        [(
            header::SET_COOKIE,
            clear_cookie(ADMIN_COOKIE, state.auth.secure_cookies),
        )],
    ))
}

async fn me(current: CurrentAdmin) -> Json<AdminUser> {
    Json(current.admin)
}

async fn overview(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
) -> ApiResult<Json<AdminOverview>> {
    Ok(Json(state.db.admin_overview().await?))
}

// ============================================================================
// Users
// ============================================================================

async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Vec<UserOverview>>> {
    let (limit, offset) = page.bounds();
    Ok(Json(state.db.list_users(limit, offset).await?))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    if body.plan.is_none() && body.disabled.is_none() {
        return Err(ApiError::BadRequest(
            "Provide at least one of plan, disabled".into(),
        ));
    }

    let mut user = None;
    if let Some(plan) = body.plan {
        user = state.db.update_user_plan(id, plan).await?;
        if user.is_none() {
            return Err(ApiError::not_found("User", id));
        }
    }
    if let Some(disabled) = body.disabled {
        user = state.db.set_user_disabled(id, disabled).await?;
    }
    let user = user.ok_or_else(|| ApiError::not_found("User", id))?;

    tracing::info!(
        admin = %admin.admin.username,
        user_id = id,
        plan = user.plan.as_str(),
        disabled = user.disabled,
        "User updated by admin"
    );
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !state.db.delete_user(id).await? {
        return Err(ApiError::not_found("User", id));
    }
    tracing::info!(admin = %admin.admin.username, user_id = id, "User deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Tasks
// ============================================================================

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let (limit, offset) = page.bounds();
    Ok(Json(state.db.list_all_tasks(limit, offset).await?))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db.admin_delete_task(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Task", id))
    }
}

// ============================================================================
// Registration codes
// ============================================================================

async fn list_codes(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
) -> ApiResult<Json<Vec<RegistrationCode>>> {
    Ok(Json(state.db.list_registration_codes().await?))
}

async fn create_code(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Json(body): Json<NewCodeRequest>,
) -> ApiResult<(StatusCode, Json<RegistrationCode>)> {
    let code = match body.code.as_deref() {
        Some(raw) => validate::registration_code(raw)?,
        None => generate_code(),
    };
    if !(1..=MAX_CODE_USES).contains(&body.max_uses) {
        return Err(ValidationError::new(
            "maxUses",
            format!("must be between 1 and {MAX_CODE_USES}"),
        )
        .into());
    }
    if body
        .expires_at
        .is_some_and(|t| t <= chrono::Utc::now().timestamp())
    {
        return Err(ValidationError::new("expiresAt", "must be in the future").into());
    }

    let created = state
        .db
        .create_registration_code(&code, body.max_uses, body.expires_at, Some(admin.admin.id))
        .await?;
    tracing::info!(admin = %admin.admin.username, code_id = created.id, "Registration code created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_code(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db.delete_registration_code(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Registration code", id))
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/logout", post(logout))
        .route("/admin/me", get(me))
        .route("/admin/overview", get(overview))
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}", patch(update_user).delete(delete_user))
        .route("/admin/tasks", get(list_tasks))
        .route("/admin/tasks/{id}", delete(delete_task))
        .route("/admin/codes", get(list_codes).post(create_code))
        .route("/admin/codes/{id}", delete(delete_code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::test_support::{build_app, send, send_full, signed_in, test_state};
    use axum::http::Method;
    use focusflow_core::NewTask;
    use serde_json::json;

    async fn admin_cookie(state: &Arc<AppState>) -> String {
        let hash = hash_password("admin-password").unwrap();
        state.db.create_admin_user("root", &hash).await.unwrap();
        let app = build_app(state.clone(), router());
        let (status, headers, body) = send_full(
            app,
            Method::POST,
            "/api/admin/login",
            None,
            Some(json!({"username": "root", "password": "admin-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "root");
        let set = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        set.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin_cookie() {
        let state = test_state().await;
        let (_, user_cookie) = signed_in(&state, "u@example.com").await;
        let app = build_app(state, router());

        let (status, _) = send(app.clone(), Method::GET, "/api/admin/overview", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // A user session is not an admin session.
        let (status, _) = send(app, Method::GET, "/api/admin/users", Some(&user_cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let state = test_state().await;
        let hash = hash_password("admin-password").unwrap();
        state.db.create_admin_user("root", &hash).await.unwrap();
        let app = build_app(state, router());
        let (status, _) = send(
            app,
            Method::POST,
            "/api/admin/login",
            None,
            Some(json!({"username": "root", "password": "guess"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_manage_users() {
        let state = test_state().await;
        let (user, user_cookie) = signed_in(&state, "u@example.com").await;
        state
            .db
            .create_task(
                user.id,
                &NewTask {
                    title: "Visible to admin".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let cookie = admin_cookie(&state).await;
        let app = build_app(state.clone(), router());

        let (status, users) = send(app.clone(), Method::GET, "/api/admin/users", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(users[0]["email"], "u@example.com");
        assert_eq!(users[0]["taskCount"], 1);

        let uri = format!("/api/admin/users/{}", user.id);
        let (status, updated) = send(
            app.clone(),
            Method::PATCH,
            &uri,
            Some(&cookie),
            Some(json!({"plan": "pro", "disabled": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["plan"], "pro");
        assert_eq!(updated["disabled"], true);

        // Disabling revoked the user's session.
        let token = user_cookie.split_once('=').unwrap().1;
        let now = chrono::Utc::now().timestamp();
        assert!(state.db.find_session_user(token, now).await.unwrap().is_none());

        let (status, _) = send(app.clone(), Method::PATCH, &uri, Some(&cookie), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, overview) = send(app.clone(), Method::GET, "/api/admin/overview", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(overview["users"], 1);
        assert_eq!(overview["disabledUsers"], 1);
        assert_eq!(overview["tasks"], 1);

        let (status, _) = send(app.clone(), Method::DELETE, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(app, Method::PATCH, &uri, Some(&cookie), Some(json!({"plan": "free"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_manage_tasks() {
        let state = test_state().await;
        let (user, _) = signed_in(&state, "u@example.com").await;
        let task = state
            .db
            .create_task(
                user.id,
                &NewTask {
                    title: "Spam".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let cookie = admin_cookie(&state).await;
        let app = build_app(state, router());

        let (_, tasks) = send(app.clone(), Method::GET, "/api/admin/tasks?limit=10", Some(&cookie), None).await;
        assert_eq!(tasks.as_array().unwrap().len(), 1);

        let uri = format!("/api/admin/tasks/{}", task.id);
        let (status, _) = send(app.clone(), Method::DELETE, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(app, Method::DELETE, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_registration_codes() {
        let state = test_state().await;
        let cookie = admin_cookie(&state).await;
        let app = build_app(state, router());

        let (status, generated) = send(
            app.clone(),
            Method::POST,
            "/api/admin/codes",
            Some(&cookie),
            Some(json!({"maxUses": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(generated["code"].as_str().unwrap().starts_with("FF-"));
        assert_eq!(generated["maxUses"], 5);
        assert_eq!(generated["uses"], 0);
        assert!(generated["createdBy"].is_number());

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/admin/codes",
            Some(&cookie),
            Some(json!({"code": "TEAM-2025"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/admin/codes",
            Some(&cookie),
            Some(json!({"code": "TEAM-2025"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["details"], "registration code already exists");

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/admin/codes",
            Some(&cookie),
            Some(json!({"maxUses": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/admin/codes",
            Some(&cookie),
            Some(json!({"expiresAt": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, codes) = send(app.clone(), Method::GET, "/api/admin/codes", Some(&cookie), None).await;
        assert_eq!(codes.as_array().unwrap().len(), 2);

        let uri = format!("/api/admin/codes/{}", generated["id"]);
        let (status, _) = send(app.clone(), Method::DELETE, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(app, Method::DELETE, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout_revokes_admin_session() {
        let state = test_state().await;
        let cookie = admin_cookie(&state).await;
        let app = build_app(state, router());

        let (status, _) = send(app.clone(), Method::GET, "/api/admin/me", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(app.clone(), Method::POST, "/api/admin/logout", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(app, Method::GET, "/api/admin/me", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
