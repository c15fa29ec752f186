//! Admin accounts, registration codes, and code-gated signup.

use super::now_ts;
use super::row_types::{AdminUserRow, RegistrationCodeRow};
use super::users::insert_user;
use crate::{Database, DbError, DbResult};
use focusflow_core::{AdminUser, RegistrationCode, User};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection};
use ts_rs::TS;

const CODE_COLUMNS: &str = "id, code, max_uses, uses, expires_at, created_at, created_by";

/// Result of trying to consume one use of a registration code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    Redeemed,
    Unknown,
    Expired,
    Exhausted,
}

/// Result of a code-gated signup.
#[derive(Debug, Clone, PartialEq)]
pub enum SignupOutcome {
    Created(User),
    /// The code does not exist or has expired.
    InvalidCode,
    CodeExhausted,
    EmailTaken,
    /// No code was given and an account already exists.
    CodeRequired,
}

/// Row counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    #[ts(type = "number")]
    pub users: i64,
    #[ts(type = "number")]
    pub disabled_users: i64,
    #[ts(type = "number")]
    pub tasks: i64,
    #[ts(type = "number")]
    pub completed_tasks: i64,
    #[ts(type = "number")]
    pub focus_sessions: i64,
    #[ts(type = "number")]
    pub focus_minutes: i64,
    #[ts(type = "number")]
    pub registration_codes: i64,
}

/// Consume one use of `code` if it is live. The increment is guarded in SQL
/// so concurrent redemptions can never exceed `max_uses`.
async fn redeem(conn: &mut SqliteConnection, code: &str, now: i64) -> DbResult<Redemption> {
    let result = sqlx::query(
        r#"
        UPDATE registration_codes SET uses = uses + 1
        WHERE code = ? AND uses < max_uses AND (expires_at IS NULL OR expires_at > ?)
        "#,
    )
    .bind(code)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() > 0 {
        return Ok(Redemption::Redeemed);
    }

    let row: Option<(i64, i64, Option<i64>)> =
        sqlx::query_as("SELECT uses, max_uses, expires_at FROM registration_codes WHERE code = ?")
            .bind(code)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(match row {
        None => Redemption::Unknown,
        Some((_, _, Some(expires_at))) if expires_at <= now => Redemption::Expired,
        Some(_) => Redemption::Exhausted,
    })
}

impl Database {
    pub async fn create_admin_user(&self, username: &str, password_hash: &str) -> DbResult<AdminUser> {
        let now = now_ts();
        let result = sqlx::query(
            "INSERT INTO admin_users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(|e| DbError::unique(e, "admin username"))?;
        Ok(AdminUser {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            created_at: now,
        })
    }

    /// An admin and their password hash, for login.
    pub async fn get_admin_by_username(&self, username: &str) -> DbResult<Option<(AdminUser, String)>> {
        let row: Option<(AdminUserRow, String)> = sqlx::query(
            "SELECT id, username, created_at, password_hash FROM admin_users WHERE username = ?",
        )
        .bind(username)
        .try_map(|row: SqliteRow| Ok((AdminUserRow::from_row(&row)?, row.try_get("password_hash")?)))
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|(a, hash)| (a.0, hash)))
    }

    pub async fn count_admins(&self) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin_users")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    /// Create a code. `DbError::Duplicate` if the code string already exists.
    pub async fn create_registration_code(
        &self,
        code: &str,
        max_uses: i64,
        expires_at: Option<i64>,
        created_by: Option<i64>,
    ) -> DbResult<RegistrationCode> {
        let now = now_ts();
        let result = sqlx::query(
            r#"
            INSERT INTO registration_codes (code, max_uses, uses, expires_at, created_at, created_by)
            VALUES (?, ?, 0, ?, ?, ?)
            "#,
        )
        .bind(code)
        .bind(max_uses)
        .bind(expires_at)
        .bind(now)
        .bind(created_by)
        .execute(self.pool())
        .await
        .map_err(|e| DbError::unique(e, "registration code"))?;
        Ok(RegistrationCode {
            id: result.last_insert_rowid(),
            code: code.to_string(),
            max_uses,
            uses: 0,
            expires_at,
            created_at: now,
            created_by,
        })
    }

    pub async fn list_registration_codes(&self) -> DbResult<Vec<RegistrationCode>> {
        let rows: Vec<RegistrationCodeRow> = sqlx::query_as(&format!(
            "SELECT {CODE_COLUMNS} FROM registration_codes ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn delete_registration_code(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM registration_codes WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn redeem_registration_code(&self, code: &str, now: i64) -> DbResult<Redemption> {
        let mut conn = self.pool().acquire().await?;
        redeem(&mut conn, code, now).await
    }

    /// Create a user, consuming one use of `code` in the same transaction.
    ///
    /// With `code = None` only the very first account may be created. The
    /// insert runs before the count so the write lock is held while checking,
    /// and two concurrent codeless signups cannot both succeed. A taken email
    /// does not burn a code use.
    pub async fn create_user_with_code(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
        code: Option<&str>,
        now: i64,
    ) -> DbResult<SignupOutcome> {
        let mut tx = self.pool().begin().await?;

        if let Some(code) = code {
            match redeem(&mut tx, code, now).await? {
                Redemption::Redeemed => {}
                Redemption::Unknown | Redemption::Expired => {
                    tx.rollback().await?;
                    return Ok(SignupOutcome::InvalidCode);
                }
                Redemption::Exhausted => {
                    tx.rollback().await?;
                    return Ok(SignupOutcome::CodeExhausted);
                }
            }
        }

        let user = match insert_user(&mut tx, email, display_name, password_hash).await {
            Ok(user) => user,
            Err(DbError::Duplicate(_)) => {
                tx.rollback().await?;
                // A taken email means an account exists, so without a code
                // the gate answers first.
                return Ok(if code.is_some() {
                    SignupOutcome::EmailTaken
                } else {
                    SignupOutcome::CodeRequired
                });
            }
            Err(e) => return Err(e),
        };

        if code.is_none() {
            let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
                .fetch_one(&mut *tx)
                .await?;
            if users > 1 {
                tx.rollback().await?;
                return Ok(SignupOutcome::CodeRequired);
            }
        }

        tx.commit().await?;
        Ok(SignupOutcome::Created(user))
    }

    pub async fn admin_overview(&self) -> DbResult<AdminOverview> {
        let row: SqliteRow = sqlx::query(
            r#"
            SELECT
              (SELECT COUNT(*) FROM users) AS users,
              (SELECT COUNT(*) FROM users WHERE disabled = 1) AS disabled_users,
              (SELECT COUNT(*) FROM tasks) AS tasks,
              (SELECT COUNT(*) FROM tasks WHERE completed = 1) AS completed_tasks,
              (SELECT COUNT(*) FROM focus_sessions WHERE session_type = 'focus') AS focus_sessions,
              (SELECT COALESCE(SUM(duration_seconds), 0) / 60 FROM focus_sessions
                WHERE session_type = 'focus' AND ended_at IS NOT NULL) AS focus_minutes,
              (SELECT COUNT(*) FROM registration_codes) AS registration_codes
            "#,
        )
        .fetch_one(self.pool())
        .await?;

        Ok(AdminOverview {
            users: row.try_get("users")?,
            disabled_users: row.try_get("disabled_users")?,
            tasks: row.try_get("tasks")?,
            completed_tasks: row.try_get("completed_tasks")?,
            focus_sessions: row.try_get("focus_sessions")?,
            focus_minutes: row.try_get("focus_minutes")?,
            registration_codes: row.try_get("registration_codes")?,
        })
    }
}
