//! Focus session lifecycle, listing, and contiguous merge.

use super::now_ts;
use super::row_types::FocusSessionRow;
use crate::{Database, DbResult};
use focusflow_core::{plan_contiguous_merge, FocusSession, NewFocusSession, SessionSpan, SessionType};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::debug;
use ts_rs::TS;

const SESSION_COLUMNS: &str =
    "id, user_id, task_id, session_type, timer_strategy, started_at, ended_at, duration_seconds";

/// Result of collapsing a task's contiguous focus sessions.
#[derive(Debug, Clone, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Number of multi-session groups collapsed.
    pub groups: u32,
    /// Number of rows deleted.
    pub removed: u32,
    /// The task's sessions after the merge, oldest first.
    pub sessions: Vec<FocusSession>,
}

/// Close an open session at `ended_at` (clamped to its start).
///
/// Ending a focus session credits its whole minutes to the linked task.
/// A session that is already closed is left as is.
async fn close_session(
    conn: &mut SqliteConnection,
    session: &FocusSession,
    ended_at: i64,
) -> DbResult<()> {
    let ended_at = ended_at.max(session.started_at);
    let duration = ended_at - session.started_at;
    let result = sqlx::query(
        "UPDATE focus_sessions SET ended_at = ?, duration_seconds = ? WHERE id = ? AND ended_at IS NULL",
    )
    .bind(ended_at)
    .bind(duration)
    .bind(session.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 && session.session_type == SessionType::Focus {
        if let Some(task_id) = session.task_id {
            sqlx::query("UPDATE tasks SET actual_minutes = actual_minutes + ? WHERE id = ?")
                .bind(duration / 60)
                .bind(task_id)
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

async fn fetch_active(conn: &mut SqliteConnection, user_id: i64) -> DbResult<Option<FocusSession>> {
    let row: Option<FocusSessionRow> = sqlx::query_as(&format!(
        "SELECT {SESSION_COLUMNS} FROM focus_sessions
         WHERE user_id = ? AND ended_at IS NULL
         ORDER BY started_at DESC, id DESC LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(|r| r.0))
}

impl Database {
    /// Start a session. Any session still running for the user is ended at
    /// the new session's start first. Returns `None` if `task_id` names a
    /// task the user does not own.
    pub async fn start_session(
        &self,
        user_id: i64,
        input: &NewFocusSession,
    ) -> DbResult<Option<FocusSession>> {
        if let Some(task_id) = input.task_id {
            if self.get_task(user_id, task_id).await?.is_none() {
                return Ok(None);
            }
        }
        let started_at = input.started_at.unwrap_or_else(now_ts);

        let mut tx = self.pool().begin().await?;
        while let Some(active) = fetch_active(&mut tx, user_id).await? {
            debug!(session_id = active.id, "ending active session before starting a new one");
            close_session(&mut tx, &active, started_at).await?;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO focus_sessions (user_id, task_id, session_type, timer_strategy, started_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(input.task_id)
        .bind(input.session_type.as_str())
        .bind(input.timer_strategy.as_str())
        .bind(started_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.get_session(user_id, result.last_insert_rowid()).await
    }

    /// End a session. Ending an already-ended session returns it unchanged.
    pub async fn end_session(
        &self,
        user_id: i64,
        id: i64,
        ended_at: Option<i64>,
    ) -> DbResult<Option<FocusSession>> {
        let Some(session) = self.get_session(user_id, id).await? else {
            return Ok(None);
        };
        if session.is_active() {
            let mut tx = self.pool().begin().await?;
            close_session(&mut tx, &session, ended_at.unwrap_or_else(now_ts)).await?;
            tx.commit().await?;
        }
        self.get_session(user_id, id).await
    }

    pub async fn get_session(&self, user_id: i64, id: i64) -> DbResult<Option<FocusSession>> {
        let row: Option<FocusSessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM focus_sessions WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(|r| r.0))
    }

    /// Sessions started within `[from, to]` (Unix seconds), oldest first.
    pub async fn list_sessions(&self, user_id: i64, from: i64, to: i64) -> DbResult<Vec<FocusSession>> {
        let rows: Vec<FocusSessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM focus_sessions
             WHERE user_id = ? AND started_at >= ? AND started_at <= ?
             ORDER BY started_at, id"
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// All sessions linked to a task, oldest first. `None` if the task is not
    /// the user's.
    pub async fn list_task_sessions(
        &self,
        user_id: i64,
        task_id: i64,
    ) -> DbResult<Option<Vec<FocusSession>>> {
        if self.get_task(user_id, task_id).await?.is_none() {
            return Ok(None);
        }
        let rows: Vec<FocusSessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM focus_sessions
             WHERE user_id = ? AND task_id = ?
             ORDER BY started_at, id"
        ))
        .bind(user_id)
        .bind(task_id)
        .fetch_all(self.pool())
        .await?;
        Ok(Some(rows.into_iter().map(|r| r.0).collect()))
    }

    pub async fn active_session(&self, user_id: i64) -> DbResult<Option<FocusSession>> {
        let mut conn = self.pool().acquire().await?;
        fetch_active(&mut conn, user_id).await
    }

    pub async fn delete_session(&self, user_id: i64, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM focus_sessions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Collapse the task's ended focus sessions that sit less than
    /// `MERGE_GAP_SECS` apart into single rows, in one transaction.
    ///
    /// Running it again on merged data changes nothing. `None` if the task is
    /// not the user's.
    pub async fn merge_contiguous_sessions(
        &self,
        user_id: i64,
        task_id: i64,
    ) -> DbResult<Option<MergeReport>> {
        if self.get_task(user_id, task_id).await?.is_none() {
            return Ok(None);
        }

        let mut tx = self.pool().begin().await?;
        let rows: Vec<FocusSessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM focus_sessions
             WHERE user_id = ? AND task_id = ? AND session_type = 'focus'
               AND ended_at IS NOT NULL
             ORDER BY started_at, id"
        ))
        .bind(user_id)
        .bind(task_id)
        .fetch_all(&mut *tx)
        .await?;

        let spans: Vec<SessionSpan> = rows
            .iter()
            .filter_map(|r| {
                let s = &r.0;
                let ended_at = s.ended_at?;
                Some(SessionSpan {
                    id: s.id,
                    started_at: s.started_at,
                    ended_at,
                    duration_seconds: s.duration_seconds.unwrap_or(ended_at - s.started_at),
                })
            })
            .collect();

        let plan = plan_contiguous_merge(&spans);
        let mut removed = 0u32;
        for group in &plan {
            sqlx::query(
                "UPDATE focus_sessions SET started_at = ?, ended_at = ?, duration_seconds = ? WHERE id = ?",
            )
            .bind(group.started_at)
            .bind(group.ended_at)
            .bind(group.duration_seconds)
            .bind(group.keep_id)
            .execute(&mut *tx)
            .await?;
            for id in &group.remove_ids {
                sqlx::query("DELETE FROM focus_sessions WHERE id = ?")
                    .bind(*id)
                    .execute(&mut *tx)
                    .await?;
                removed += 1;
            }
        }
        tx.commit().await?;

        if !plan.is_empty() {
            debug!(task_id, groups = plan.len(), removed, "merged contiguous sessions");
        }

        let sessions = self.list_task_sessions(user_id, task_id).await?.unwrap_or_default();
        Ok(Some(MergeReport {
            groups: plan.len() as u32,
            removed,
            sessions,
        }))
    }
}
