//! Login sessions for users and admins.
//!
//! Tokens are opaque random strings handed to the client; only their SHA-256
//! hex digest is stored, so a leaked database does not leak live sessions.

use super::row_types::{AdminUserRow, UserRow};
use crate::{Database, DbResult};
use focusflow_core::{AdminUser, User};
use sha2::{Digest, Sha256};

use super::now_ts;

/// SHA-256 hex digest of a session token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl Database {
    /// Store a new user session valid for `ttl_secs` from now.
    pub async fn create_auth_session(&self, user_id: i64, token: &str, ttl_secs: i64) -> DbResult<()> {
        let now = now_ts();
        sqlx::query(
            "INSERT INTO auth_sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(hash_token(token))
        .bind(user_id)
        .bind(now)
        .bind(now + ttl_secs)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Resolve a session token to its user. Expired sessions and disabled
    /// accounts resolve to `None`.
    pub async fn find_session_user(&self, token: &str, now: i64) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.email, u.display_name, u.plan, u.disabled, u.created_at
            FROM auth_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ? AND s.expires_at > ? AND u.disabled = 0
            "#,
        )
        .bind(hash_token(token))
        .bind(now)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn delete_auth_session(&self, token: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop expired user and admin sessions. Returns the number removed.
    pub async fn purge_expired_sessions(&self, now: i64) -> DbResult<u64> {
        let users = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(self.pool())
            .await?;
        let admins = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(self.pool())
            .await?;
        Ok(users.rows_affected() + admins.rows_affected())
    }

    pub async fn create_admin_session(&self, admin_id: i64, token: &str, ttl_secs: i64) -> DbResult<()> {
        let now = now_ts();
        sqlx::query(
            "INSERT INTO admin_sessions (token_hash, admin_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(hash_token(token))
        .bind(admin_id)
        .bind(now)
        .bind(now + ttl_secs)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn find_admin_session(&self, token: &str, now: i64) -> DbResult<Option<AdminUser>> {
        let row: Option<AdminUserRow> = sqlx::query_as(
            r#"
            SELECT a.id, a.username, a.created_at
            FROM admin_sessions s
            JOIN admin_users a ON a.id = s.admin_id
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#,
        )
        .bind(hash_token(token))
        .bind(now)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn delete_admin_session(&self, token: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
