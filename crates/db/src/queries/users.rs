//! User account queries.

use super::now_ts;
use super::row_types::UserRow;
use crate::{Database, DbError, DbResult};
use focusflow_core::{Plan, User};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection};
use ts_rs::TS;

const USER_COLUMNS: &str = "id, email, display_name, plan, disabled, created_at";

/// A user row for the admin console, with activity totals.
#[derive(Debug, Clone, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct UserOverview {
    #[serde(flatten)]
    #[ts(flatten)]
    pub user: User,
    #[ts(type = "number")]
    pub task_count: i64,
    #[ts(type = "number")]
    pub focus_minutes: i64,
}

/// Insert a user on an existing connection so signup can share a transaction
/// with registration-code redemption. `email` must already be normalized.
pub(crate) async fn insert_user(
    conn: &mut SqliteConnection,
    email: &str,
    display_name: &str,
    password_hash: &str,
) -> DbResult<User> {
    let now = now_ts();
    let result = sqlx::query(
        "INSERT INTO users (email, display_name, password_hash, plan, disabled, created_at)
         VALUES (?, ?, ?, 'free', 0, ?)",
    )
    .bind(email)
    .bind(display_name)
    .bind(password_hash)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::unique(e, "email"))?;

    Ok(User {
        id: result.last_insert_rowid(),
        email: email.to_string(),
        display_name: display_name.to_string(),
        plan: Plan::Free,
        disabled: false,
        created_at: now,
    })
}

impl Database {
    /// Create a user. Fails with `DbError::Duplicate("email")` if the email
    /// is already registered (case-insensitive).
    pub async fn create_user(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
    ) -> DbResult<User> {
        let mut conn = self.pool().acquire().await?;
        insert_user(&mut conn, email, display_name, password_hash).await
    }

    pub async fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self.user_credentials(email).await?.map(|(user, _)| user))
    }

    /// Look up a user and their password hash for login.
    pub async fn user_credentials(&self, email: &str) -> DbResult<Option<(User, String)>> {
        let row: Option<(UserRow, String)> = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?"
        ))
        .bind(email)
        .try_map(|row: SqliteRow| {
            Ok((UserRow::from_row(&row)?, row.try_get("password_hash")?))
        })
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|(u, hash)| (u.0, hash)))
    }

    /// All users, newest first, with their task count and total focus minutes.
    pub async fn list_users(&self, limit: i64, offset: i64) -> DbResult<Vec<UserOverview>> {
        let rows: Vec<(UserRow, i64, i64)> = sqlx::query(
            r#"
            SELECT u.id, u.email, u.display_name, u.plan, u.disabled, u.created_at,
                   (SELECT COUNT(*) FROM tasks t WHERE t.user_id = u.id) AS task_count,
                   (SELECT COALESCE(SUM(fs.duration_seconds), 0) / 60
                      FROM focus_sessions fs
                     WHERE fs.user_id = u.id AND fs.session_type = 'focus'
                       AND fs.ended_at IS NOT NULL) AS focus_minutes
            FROM users u
            ORDER BY u.created_at DESC, u.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .try_map(|row: SqliteRow| {
            Ok((
                UserRow::from_row(&row)?,
                row.try_get("task_count")?,
                row.try_get("focus_minutes")?,
            ))
        })
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user, task_count, focus_minutes)| UserOverview {
                user: user.0,
                task_count,
                focus_minutes,
            })
            .collect())
    }

    pub async fn update_user_plan(&self, id: i64, plan: Plan) -> DbResult<Option<User>> {
        let result = sqlx::query("UPDATE users SET plan = ? WHERE id = ?")
            .bind(plan.as_str())
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(id).await
    }

    /// Disabling a user also revokes all of their login sessions.
    pub async fn set_user_disabled(&self, id: i64, disabled: bool) -> DbResult<Option<User>> {
        let mut tx = self.pool().begin().await?;
        let result = sqlx::query("UPDATE users SET disabled = ? WHERE id = ?")
            .bind(disabled)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        if disabled {
            sqlx::query("DELETE FROM auth_sessions WHERE user_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        self.get_user(id).await
    }

    /// Delete a user and everything they own. Returns false if no such user.
    pub async fn delete_user(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_users(&self) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
