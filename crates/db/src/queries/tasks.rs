//! Task CRUD and board ordering.

use super::now_ts;
use super::row_types::{encode_tags, TaskRow};
use crate::{Database, DbResult};
use focusflow_core::{NewTask, Task, TaskFilter, TaskPatch};
use sqlx::{QueryBuilder, Sqlite};

/// Task columns plus per-task subtask counts, aliased `t`.
pub(crate) const TASK_SELECT: &str = r#"
SELECT t.id, t.user_id, t.title, t.description, t.priority, t.estimated_minutes,
       t.actual_minutes, t.completed, t.completed_at, t.due_date, t.project, t.tags,
       t.position, t.created_at, t.updated_at,
       (SELECT COUNT(*) FROM subtasks s WHERE s.task_id = t.id) AS subtask_count,
       (SELECT COUNT(*) FROM subtasks s WHERE s.task_id = t.id AND s.completed = 1) AS subtasks_completed
FROM tasks t
"#;

impl Database {
    /// Insert a task at the end of the user's board. Input is expected to be
    /// validated already.
    pub async fn create_task(&self, user_id: i64, task: &NewTask) -> DbResult<Task> {
        let now = now_ts();
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (user_id, title, description, priority, estimated_minutes,
                               due_date, project, tags, position, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?,
                    (SELECT COALESCE(MAX(position), -1) + 1 FROM tasks WHERE user_id = ?),
                    ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.estimated_minutes)
        .bind(&task.due_date)
        .bind(&task.project)
        .bind(encode_tags(&task.tags))
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        let row: TaskRow = sqlx::query_as(&format!("{TASK_SELECT} WHERE t.id = ?"))
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(row.0)
    }

    /// Fetch one of the user's tasks. Another user's task reads as missing.
    pub async fn get_task(&self, user_id: i64, id: i64) -> DbResult<Option<Task>> {
        let row: Option<TaskRow> =
            sqlx::query_as(&format!("{TASK_SELECT} WHERE t.id = ? AND t.user_id = ?"))
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(|r| r.0))
    }

    /// The user's tasks: open before completed, then board position.
    ///
    /// `completed` and `project` filter in SQL; `tag` is matched after
    /// decoding since tags are stored as a JSON array.
    pub async fn list_tasks(&self, user_id: i64, filter: &TaskFilter) -> DbResult<Vec<Task>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(TASK_SELECT);
        qb.push(" WHERE t.user_id = ").push_bind(user_id);
        if let Some(completed) = filter.completed {
            qb.push(" AND t.completed = ").push_bind(completed);
        }
        if let Some(project) = &filter.project {
            qb.push(" AND t.project = ").push_bind(project.clone());
        }
        qb.push(" ORDER BY t.completed ASC, t.position ASC, t.id ASC");

        let rows: Vec<TaskRow> = qb.build_query_as().fetch_all(self.pool()).await?;
        let tasks = rows.into_iter().map(|r| r.0);
        // Tags are deduplicated ignoring ASCII case, so match the same way.
        Ok(match filter.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tag) => tasks
                .filter(|t| t.tags.iter().any(|x| x.eq_ignore_ascii_case(tag)))
                .collect(),
            None => tasks.collect(),
        })
    }

    /// Apply a partial update. Completing a task stamps `completed_at`;
    /// reopening it clears the stamp. Returns `None` if the task does not
    /// exist or belongs to someone else.
    pub async fn update_task(
        &self,
        user_id: i64,
        id: i64,
        patch: &TaskPatch,
    ) -> DbResult<Option<Task>> {
        let Some(mut task) = self.get_task(user_id, id).await? else {
            return Ok(None);
        };
        let now = now_ts();

        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = description.clone();
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(estimate) = patch.estimated_minutes {
            task.estimated_minutes = estimate;
        }
        if let Some(actual) = patch.actual_minutes {
            task.actual_minutes = actual;
        }
        if let Some(completed) = patch.completed {
            if completed && !task.completed {
                task.completed_at = Some(now);
            } else if !completed {
                task.completed_at = None;
            }
            task.completed = completed;
        }
        if let Some(due) = &patch.due_date {
            task.due_date = due.clone();
        }
        if let Some(project) = &patch.project {
            task.project = project.clone();
        }
        if let Some(tags) = &patch.tags {
            task.tags = tags.clone();
        }
        if let Some(position) = patch.position {
            task.position = position;
        }

        sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, priority = ?, estimated_minutes = ?,
                actual_minutes = ?, completed = ?, completed_at = ?, due_date = ?,
                project = ?, tags = ?, position = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.estimated_minutes)
        .bind(task.actual_minutes)
        .bind(task.completed)
        .bind(task.completed_at)
        .bind(&task.due_date)
        .bind(&task.project)
        .bind(encode_tags(&task.tags))
        .bind(task.position)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        self.get_task(user_id, id).await
    }

    pub async fn delete_task(&self, user_id: i64, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rewrite board positions so `ids[i]` gets position `i`.
    ///
    /// All-or-nothing: if any id is missing or not the user's, nothing
    /// changes and `false` is returned.
    pub async fn reorder_tasks(&self, user_id: i64, ids: &[i64]) -> DbResult<bool> {
        let now = now_ts();
        let mut tx = self.pool().begin().await?;
        for (position, id) in ids.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE tasks SET position = ?, updated_at = ? WHERE id = ? AND user_id = ?",
            )
            .bind(position as i64)
            .bind(now)
            .bind(*id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(false);
            }
        }
        tx.commit().await?;
        Ok(true)
    }

    /// Every task across all users, newest first (admin console).
    pub async fn list_all_tasks(&self, limit: i64, offset: i64) -> DbResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "{TASK_SELECT} ORDER BY t.created_at DESC, t.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn admin_delete_task(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
