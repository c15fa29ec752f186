//! Subtask CRUD. Ownership is always checked through the parent task.

use super::now_ts;
use super::row_types::SubtaskRow;
use crate::{Database, DbResult};
use focusflow_core::{NewSubtask, Subtask, SubtaskPatch};

const SUBTASK_SELECT: &str = r#"
SELECT s.id, s.task_id, s.title, s.description, s.priority, s.estimated_minutes,
       s.actual_minutes, s.completed, s.position, s.created_at, s.updated_at
FROM subtasks s
JOIN tasks t ON t.id = s.task_id
"#;

impl Database {
    /// Add a subtask at the end of the task's list. `None` if the task is not
    /// the user's.
    pub async fn create_subtask(
        &self,
        user_id: i64,
        task_id: i64,
        subtask: &NewSubtask,
    ) -> DbResult<Option<Subtask>> {
        if self.get_task(user_id, task_id).await?.is_none() {
            return Ok(None);
        }
        let now = now_ts();
        let result = sqlx::query(
            r#"
            INSERT INTO subtasks (task_id, title, description, priority, estimated_minutes,
                                  position, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?,
                    (SELECT COALESCE(MAX(position), -1) + 1 FROM subtasks WHERE task_id = ?),
                    ?, ?)
            "#,
        )
        .bind(task_id)
        .bind(&subtask.title)
        .bind(&subtask.description)
        .bind(subtask.priority.as_str())
        .bind(subtask.estimated_minutes)
        .bind(task_id)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;
        self.get_subtask(user_id, result.last_insert_rowid()).await
    }

    pub async fn get_subtask(&self, user_id: i64, id: i64) -> DbResult<Option<Subtask>> {
        let row: Option<SubtaskRow> =
            sqlx::query_as(&format!("{SUBTASK_SELECT} WHERE s.id = ? AND t.user_id = ?"))
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(|r| r.0))
    }

    /// Subtasks of one task in list order. `None` if the task is not the user's.
    pub async fn list_subtasks(&self, user_id: i64, task_id: i64) -> DbResult<Option<Vec<Subtask>>> {
        if self.get_task(user_id, task_id).await?.is_none() {
            return Ok(None);
        }
        let rows: Vec<SubtaskRow> = sqlx::query_as(&format!(
            "{SUBTASK_SELECT} WHERE s.task_id = ? AND t.user_id = ? ORDER BY s.position, s.id"
        ))
        .bind(task_id)
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(Some(rows.into_iter().map(|r| r.0).collect()))
    }

    pub async fn update_subtask(
        &self,
        user_id: i64,
        id: i64,
        patch: &SubtaskPatch,
    ) -> DbResult<Option<Subtask>> {
        let Some(mut subtask) = self.get_subtask(user_id, id).await? else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            subtask.title = title.clone();
        }
        if let Some(description) = &patch.description {
            subtask.description = description.clone();
        }
        if let Some(priority) = patch.priority {
            subtask.priority = priority;
        }
        if let Some(estimate) = patch.estimated_minutes {
            subtask.estimated_minutes = estimate;
        }
        if let Some(actual) = patch.actual_minutes {
            subtask.actual_minutes = actual;
        }
        if let Some(completed) = patch.completed {
            subtask.completed = completed;
        }
        if let Some(position) = patch.position {
            subtask.position = position;
        }

        sqlx::query(
            r#"
            UPDATE subtasks
            SET title = ?, description = ?, priority = ?, estimated_minutes = ?,
                actual_minutes = ?, completed = ?, position = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&subtask.title)
        .bind(&subtask.description)
        .bind(subtask.priority.as_str())
        .bind(subtask.estimated_minutes)
        .bind(subtask.actual_minutes)
        .bind(subtask.completed)
        .bind(subtask.position)
        .bind(now_ts())
        .bind(id)
        .execute(self.pool())
        .await?;

        self.get_subtask(user_id, id).await
    }

    pub async fn delete_subtask(&self, user_id: i64, id: i64) -> DbResult<bool> {
        let result = sqlx::query(
            "DELETE FROM subtasks WHERE id = ? AND task_id IN (SELECT id FROM tasks WHERE user_id = ?)",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
