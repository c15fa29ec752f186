// crates/server/src/auth.rs
//! Credentials, session tokens and the request extractors that resolve them.
//!
//! Users authenticate with the `focusflow_session` cookie (or an
//! `Authorization: Bearer` header for non-browser clients); the admin console
//! uses the separate `focusflow_admin` cookie. Only a SHA-256 of each token is
//! stored server-side.

use std::sync::{Arc, OnceLock};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use focusflow_core::{AdminUser, User};
use focusflow_db::Database;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "focusflow_session";
pub const ADMIN_COOKIE: &str = "focusflow_admin";

/// Hash a password with Argon2id and a fresh random salt (PHC string).
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Check a password against a stored PHC hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Hashed on first use; checked against when an account does not exist so
/// unknown and known logins take the same time.
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
}

/// Verify `password` on the blocking pool. With `hash = None` the check runs
/// against a dummy hash and always fails.
pub async fn check_password(password: String, hash: Option<String>) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            let dummy = DUMMY_HASH
                .get_or_init(|| hash_password("focusflow-no-such-account").unwrap_or_default());
            let _ = verify_password(&password, dummy);
            false
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("password check task failed: {e}")))
}

/// New opaque session token.
pub fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Find a cookie value by name in the `Cookie` header(s).
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
        .filter(|v| !v.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// `Set-Cookie` value that stores `token` for `max_age_secs`.
pub fn session_cookie(name: &str, token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the cookie immediately.
pub fn clear_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

/// The signed-in user. Rejects with 401 when the token is missing, unknown,
/// expired, or belongs to a disabled account.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_cookie(&parts.headers, SESSION_COOKIE)
            .or_else(|| bearer_token(&parts.headers))
            .ok_or(ApiError::Unauthorized("Not signed in"))?;
        let user = state
            .db
            .find_session_user(&token, now_ts())
            .await?
            .ok_or(ApiError::Unauthorized("Session expired or invalid"))?;
        Ok(CurrentUser { user, token })
    }
}

/// The signed-in admin console operator.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub admin: AdminUser,
    pub token: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_cookie(&parts.headers, ADMIN_COOKIE)
            .ok_or(ApiError::Unauthorized("Admin login required"))?;
        let admin = state
            .db
            .find_admin_session(&token, now_ts())
            .await?
            .ok_or(ApiError::Unauthorized("Admin session expired or invalid"))?;
        Ok(CurrentAdmin { admin, token })
    }
}

/// Create the configured admin account if no admin exists yet.
///
/// Returns `true` when an account was created. Without a configured password
/// nothing happens and the admin console stays locked.
pub async fn bootstrap_admin(db: &Database, auth: &AuthConfig) -> anyhow::Result<bool> {
    if db.count_admins().await? > 0 {
        return Ok(false);
    }
    let Some(password) = auth.admin_password.as_deref().filter(|p| !p.is_empty()) else {
        warn!("No admin account exists and no admin password is configured; admin console disabled");
        return Ok(false);
    };
    let hash = hash_password_blocking(password.to_string())
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    db.create_admin_user(&auth.admin_username, &hash).await?;
    info!(username = %auth.admin_username, "Bootstrapped admin account");
    Ok(true)
}
