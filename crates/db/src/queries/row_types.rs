// crates/db/src/queries/row_types.rs
// Internal row types: decode SQLite rows into core domain types.
//
// The core types live in another crate, so each gets a local newtype to carry
// the `FromRow` impl. Enum columns that fail to parse surface as
// `sqlx::Error::Decode` rather than being silently defaulted.

use focusflow_core::{
    decode_enum, AdminUser, FocusSession, GoalTargetType, Plan, Priority, RegistrationCode,
    SessionType, Subtask, Task, TimerStrategy, User, UserSettings,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn decode<T>(
    kind: &'static str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, sqlx::Error> {
    decode_enum(kind, raw, parse).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Tags are stored as a JSON array. A blank column reads as no tags;
/// anything else that is not a string array is a decode error.
pub(crate) fn decode_tags(raw: &str) -> Result<Vec<String>, sqlx::Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: "tags".to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn encode_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) struct UserRow(pub User);

impl<'r> sqlx::FromRow<'r, SqliteRow> for UserRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let plan: String = row.try_get("plan")?;
        Ok(Self(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            plan: decode("plan", &plan, Plan::parse_str)?,
            disabled: row.try_get("disabled")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

/// Expects the `subtask_count` / `subtasks_completed` columns produced by
/// [`TASK_SELECT`](super::tasks::TASK_SELECT).
pub(crate) struct TaskRow(pub Task);

impl<'r> sqlx::FromRow<'r, SqliteRow> for TaskRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let priority: String = row.try_get("priority")?;
        let tags: String = row.try_get("tags")?;
        Ok(Self(Task {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            priority: decode("priority", &priority, Priority::parse_str)?,
            estimated_minutes: row.try_get("estimated_minutes")?,
            actual_minutes: row.try_get("actual_minutes")?,
            completed: row.try_get("completed")?,
            completed_at: row.try_get("completed_at")?,
            due_date: row.try_get("due_date")?,
            project: row.try_get("project")?,
            tags: decode_tags(&tags)?,
            position: row.try_get("position")?,
            subtask_count: row.try_get("subtask_count")?,
            subtasks_completed: row.try_get("subtasks_completed")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

pub(crate) struct SubtaskRow(pub Subtask);

impl<'r> sqlx::FromRow<'r, SqliteRow> for SubtaskRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let priority: String = row.try_get("priority")?;
        Ok(Self(Subtask {
            id: row.try_get("id")?,
            task_id: row.try_get("task_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            priority: decode("priority", &priority, Priority::parse_str)?,
            estimated_minutes: row.try_get("estimated_minutes")?,
            actual_minutes: row.try_get("actual_minutes")?,
            completed: row.try_get("completed")?,
            position: row.try_get("position")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

pub(crate) struct FocusSessionRow(pub FocusSession);

impl<'r> sqlx::FromRow<'r, SqliteRow> for FocusSessionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let session_type: String = row.try_get("session_type")?;
        let strategy: String = row.try_get("timer_strategy")?;
        Ok(Self(FocusSession {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            task_id: row.try_get("task_id")?,
            session_type: decode("session_type", &session_type, SessionType::parse_str)?,
            timer_strategy: decode("timer_strategy", &strategy, TimerStrategy::parse_str)?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
            duration_seconds: row.try_get("duration_seconds")?,
        }))
    }
}

pub(crate) struct SettingsRow(pub UserSettings);

impl<'r> sqlx::FromRow<'r, SqliteRow> for SettingsRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let strategy: String = row.try_get("timer_strategy")?;
        Ok(Self(UserSettings {
            focus_minutes: row.try_get("focus_minutes")?,
            short_break_minutes: row.try_get("short_break_minutes")?,
            long_break_minutes: row.try_get("long_break_minutes")?,
            cycles_before_long_break: row.try_get("cycles_before_long_break")?,
            daily_goal_minutes: row.try_get("daily_goal_minutes")?,
            auto_start_breaks: row.try_get("auto_start_breaks")?,
            auto_start_focus: row.try_get("auto_start_focus")?,
            sound_enabled: row.try_get("sound_enabled")?,
            timer_strategy: decode("timer_strategy", &strategy, TimerStrategy::parse_str)?,
        }))
    }
}

/// A goal as stored; `current_value` and progress are filled in later.
#[derive(Debug, Clone)]
pub(crate) struct GoalRow {
    pub id: i64,
    pub title: String,
    pub target_type: GoalTargetType,
    pub target_value: i64,
    pub start_date: String,
    pub end_date: String,
    pub created_at: i64,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for GoalRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let target_type: String = row.try_get("target_type")?;
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            target_type: decode("target_type", &target_type, GoalTargetType::parse_str)?,
            target_value: row.try_get("target_value")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

pub(crate) struct RegistrationCodeRow(pub RegistrationCode);

impl<'r> sqlx::FromRow<'r, SqliteRow> for RegistrationCodeRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(RegistrationCode {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            max_uses: row.try_get("max_uses")?,
            uses: row.try_get("uses")?,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
            created_by: row.try_get("created_by")?,
        }))
    }
}

pub(crate) struct AdminUserRow(pub AdminUser);

impl<'r> sqlx::FromRow<'r, SqliteRow> for AdminUserRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(AdminUser {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}
