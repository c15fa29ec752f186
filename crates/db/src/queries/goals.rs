//! Goals, with progress recomputed from activity on every read.

use super::now_ts;
use super::row_types::GoalRow;
use crate::{Database, DbResult};
use focusflow_core::{
    end_of_day, goal_progress, parse_day, start_of_day, Goal, GoalPatch, GoalTargetType, NewGoal,
};

const GOAL_COLUMNS: &str = "id, title, target_type, target_value, start_date, end_date, created_at";

impl Database {
    /// Activity counted toward a goal between two inclusive days.
    async fn goal_current_value(
        &self,
        user_id: i64,
        target_type: GoalTargetType,
        start_date: &str,
        end_date: &str,
    ) -> DbResult<i64> {
        let from = start_of_day(parse_day(start_date)?);
        let to = end_of_day(parse_day(end_date)?);

        let value = match target_type {
            GoalTargetType::FocusMinutes => {
                let (secs,): (i64,) = sqlx::query_as(
                    r#"
                    SELECT COALESCE(SUM(duration_seconds), 0) FROM focus_sessions
                    WHERE user_id = ? AND session_type = 'focus' AND ended_at IS NOT NULL
                      AND started_at BETWEEN ? AND ?
                    "#,
                )
                .bind(user_id)
                .bind(from)
                .bind(to)
                .fetch_one(self.pool())
                .await?;
                secs / 60
            }
            GoalTargetType::FocusSessions => {
                let (count,): (i64,) = sqlx::query_as(
                    r#"
                    SELECT COUNT(*) FROM focus_sessions
                    WHERE user_id = ? AND session_type = 'focus' AND ended_at IS NOT NULL
                      AND started_at BETWEEN ? AND ?
                    "#,
                )
                .bind(user_id)
                .bind(from)
                .bind(to)
                .fetch_one(self.pool())
                .await?;
                count
            }
            GoalTargetType::TasksCompleted => {
                let (count,): (i64,) = sqlx::query_as(
                    r#"
                    SELECT COUNT(*) FROM tasks
                    WHERE user_id = ? AND completed = 1 AND completed_at BETWEEN ? AND ?
                    "#,
                )
                .bind(user_id)
                .bind(from)
                .bind(to)
                .fetch_one(self.pool())
                .await?;
                count
            }
        };
        Ok(value)
    }

    async fn hydrate_goal(&self, user_id: i64, row: GoalRow) -> DbResult<Goal> {
        let current_value = self
            .goal_current_value(user_id, row.target_type, &row.start_date, &row.end_date)
            .await?;
        Ok(Goal {
            id: row.id,
            title: row.title,
            target_type: row.target_type,
            target_value: row.target_value,
            current_value,
            progress: goal_progress(row.target_value, current_value),
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        })
    }

    async fn get_goal_row(&self, user_id: i64, id: i64) -> DbResult<Option<GoalRow>> {
        Ok(sqlx::query_as(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?)
    }

    /// Create a goal. Input is expected to be validated already.
    pub async fn create_goal(&self, user_id: i64, goal: &NewGoal) -> DbResult<Goal> {
        let now = now_ts();
        let result = sqlx::query(
            r#"
            INSERT INTO goals (user_id, title, target_type, target_value, start_date, end_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&goal.title)
        .bind(goal.target_type.as_str())
        .bind(goal.target_value)
        .bind(&goal.start_date)
        .bind(&goal.end_date)
        .bind(now)
        .execute(self.pool())
        .await?;

        let row = GoalRow {
            id: result.last_insert_rowid(),
            title: goal.title.clone(),
            target_type: goal.target_type,
            target_value: goal.target_value,
            start_date: goal.start_date.clone(),
            end_date: goal.end_date.clone(),
            created_at: now,
        };
        self.hydrate_goal(user_id, row).await
    }

    /// All of a user's goals, ending soonest first.
    pub async fn list_goals(&self, user_id: i64) -> DbResult<Vec<Goal>> {
        let rows: Vec<GoalRow> = sqlx::query_as(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ? ORDER BY end_date, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        let mut goals = Vec::with_capacity(rows.len());
        for row in rows {
            goals.push(self.hydrate_goal(user_id, row).await?);
        }
        Ok(goals)
    }

    pub async fn get_goal(&self, user_id: i64, id: i64) -> DbResult<Option<Goal>> {
        match self.get_goal_row(user_id, id).await? {
            Some(row) => Ok(Some(self.hydrate_goal(user_id, row).await?)),
            None => Ok(None),
        }
    }

    /// Partial update. The patch is expected to be validated against the
    /// goal's current dates already.
    pub async fn update_goal(&self, user_id: i64, id: i64, patch: &GoalPatch) -> DbResult<Option<Goal>> {
        let Some(mut row) = self.get_goal_row(user_id, id).await? else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            row.title = title.clone();
        }
        if let Some(target_type) = patch.target_type {
            row.target_type = target_type;
        }
        if let Some(target_value) = patch.target_value {
            row.target_value = target_value;
        }
        if let Some(start) = &patch.start_date {
            row.start_date = start.clone();
        }
        if let Some(end) = &patch.end_date {
            row.end_date = end.clone();
        }

        sqlx::query(
            r#"
            UPDATE goals
            SET title = ?, target_type = ?, target_value = ?, start_date = ?, end_date = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&row.title)
        .bind(row.target_type.as_str())
        .bind(row.target_value)
        .bind(&row.start_date)
        .bind(&row.end_date)
        .bind(id)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        Ok(Some(self.hydrate_goal(user_id, row).await?))
    }

    pub async fn delete_goal(&self, user_id: i64, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM goals WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
