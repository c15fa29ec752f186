// crates/core/src/types.rs
//! Domain types shared by the database layer and the HTTP API.
//!
//! Wire types serialize as camelCase. Enums serialize as the same snake_case
//! strings that are stored in the database (`as_str` / `parse_str`).

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::DecodeError;
use crate::goals::GoalProgress;

// ============================================================================
// Enums
// ============================================================================

/// Subscription tier of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Enterprise => "enterprise",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Plan::Free),
            "pro" => Some(Plan::Pro),
            "enterprise" => Some(Plan::Enterprise),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// Label a focus session was worked under. Doubles as the timer mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Focus => "focus",
            SessionType::ShortBreak => "short_break",
            SessionType::LongBreak => "long_break",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "focus" => Some(SessionType::Focus),
            "short_break" => Some(SessionType::ShortBreak),
            "long_break" => Some(SessionType::LongBreak),
            _ => None,
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionType::Focus)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "snake_case")]
pub enum TimerStrategy {
    /// Fixed focus/break blocks with a long break every N cycles.
    #[default]
    Pomodoro,
    /// Open-ended focus; the break is proportional to the focus just done.
    Flowtime,
    /// User-chosen durations per session.
    Custom,
}

impl TimerStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStrategy::Pomodoro => "pomodoro",
            TimerStrategy::Flowtime => "flowtime",
            TimerStrategy::Custom => "custom",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "pomodoro" => Some(TimerStrategy::Pomodoro),
            "flowtime" => Some(TimerStrategy::Flowtime),
            "custom" => Some(TimerStrategy::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "snake_case")]
pub enum GoalTargetType {
    FocusMinutes,
    FocusSessions,
    TasksCompleted,
}

impl GoalTargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalTargetType::FocusMinutes => "focus_minutes",
            GoalTargetType::FocusSessions => "focus_sessions",
            GoalTargetType::TasksCompleted => "tasks_completed",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "focus_minutes" => Some(GoalTargetType::FocusMinutes),
            "focus_sessions" => Some(GoalTargetType::FocusSessions),
            "tasks_completed" => Some(GoalTargetType::TasksCompleted),
            _ => None,
        }
    }
}

/// Decode a stored enum column, naming the column kind on failure.
pub fn decode_enum<T>(
    kind: &'static str,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, DecodeError> {
    parse(value).ok_or_else(|| DecodeError::unknown(kind, value))
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[ts(type = "number")]
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub plan: Plan,
    pub disabled: bool,
    #[ts(type = "number")]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[ts(type = "number | null")]
    pub estimated_minutes: Option<i64>,
    #[ts(type = "number")]
    pub actual_minutes: i64,
    pub completed: bool,
    #[ts(type = "number | null")]
    pub completed_at: Option<i64>,
    /// ISO `YYYY-MM-DD`.
    pub due_date: Option<String>,
    pub project: Option<String>,
    pub tags: Vec<String>,
    #[ts(type = "number")]
    pub position: i64,
    #[ts(type = "number")]
    pub subtask_count: i64,
    #[ts(type = "number")]
    pub subtasks_completed: i64,
    #[ts(type = "number")]
    pub created_at: i64,
    #[ts(type = "number")]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub task_id: i64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[ts(type = "number | null")]
    pub estimated_minutes: Option<i64>,
    #[ts(type = "number")]
    pub actual_minutes: i64,
    pub completed: bool,
    #[ts(type = "number")]
    pub position: i64,
    #[ts(type = "number")]
    pub created_at: i64,
    #[ts(type = "number")]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    #[ts(type = "number")]
    pub id: i64,
    #[ts(type = "number")]
    pub user_id: i64,
    #[ts(type = "number | null")]
    pub task_id: Option<i64>,
    pub session_type: SessionType,
    pub timer_strategy: TimerStrategy,
    #[ts(type = "number")]
    pub started_at: i64,
    #[ts(type = "number | null")]
    pub ended_at: Option<i64>,
    /// Worked seconds. Set when the session ends; summed when sessions merge,
    /// so it can be shorter than `ended_at - started_at`.
    #[ts(type = "number | null")]
    pub duration_seconds: Option<i64>,
}

impl FocusSession {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[ts(type = "number")]
    pub focus_minutes: i64,
    #[ts(type = "number")]
    pub short_break_minutes: i64,
    #[ts(type = "number")]
    pub long_break_minutes: i64,
    #[ts(type = "number")]
    pub cycles_before_long_break: i64,
    #[ts(type = "number")]
    pub daily_goal_minutes: i64,
    pub auto_start_breaks: bool,
    pub auto_start_focus: bool,
    pub sound_enabled: bool,
    pub timer_strategy: TimerStrategy,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            cycles_before_long_break: 4,
            daily_goal_minutes: 120,
            auto_start_breaks: false,
            auto_start_focus: false,
            sound_enabled: true,
            timer_strategy: TimerStrategy::Pomodoro,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[ts(type = "number")]
    pub id: i64,
    pub title: String,
    pub target_type: GoalTargetType,
    #[ts(type = "number")]
    pub target_value: i64,
    /// Recomputed from sessions/tasks every time the goal is read.
    #[ts(type = "number")]
    pub current_value: i64,
    pub progress: GoalProgress,
    pub start_date: String,
    pub end_date: String,
    #[ts(type = "number")]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCode {
    #[ts(type = "number")]
    pub id: i64,
    pub code: String,
    #[ts(type = "number")]
    pub max_uses: i64,
    #[ts(type = "number")]
    pub uses: i64,
    #[ts(type = "number | null")]
    pub expires_at: Option<i64>,
    #[ts(type = "number")]
    pub created_at: i64,
    #[ts(type = "number | null")]
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    #[ts(type = "number")]
    pub id: i64,
    pub username: String,
    #[ts(type = "number")]
    pub created_at: i64,
}

// ============================================================================
// Inputs
// ============================================================================

/// Deserialize a field that distinguishes "absent" from "explicit null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent => `None`, `null` => `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    pub estimated_minutes: Option<i64>,
    pub due_date: Option<String>,
    pub project: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_minutes: Option<Option<i64>>,
    pub actual_minutes: Option<i64>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub project: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub project: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubtask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    pub estimated_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_minutes: Option<Option<i64>>,
    pub actual_minutes: Option<i64>,
    pub completed: Option<bool>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFocusSession {
    #[serde(default)]
    pub session_type: SessionType,
    #[serde(default)]
    pub timer_strategy: TimerStrategy,
    pub task_id: Option<i64>,
    /// Defaults to now. Lets clients that were offline backfill the start.
    pub started_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub focus_minutes: Option<i64>,
    pub short_break_minutes: Option<i64>,
    pub long_break_minutes: Option<i64>,
    pub cycles_before_long_break: Option<i64>,
    pub daily_goal_minutes: Option<i64>,
    pub auto_start_breaks: Option<bool>,
    pub auto_start_focus: Option<bool>,
    pub sound_enabled: Option<bool>,
    pub timer_strategy: Option<TimerStrategy>,
}

impl SettingsPatch {
    /// Overlay the provided fields onto `settings`.
    pub fn apply_to(&self, settings: &mut UserSettings) {
        if let Some(v) = self.focus_minutes {
            settings.focus_minutes = v;
        }
        if let Some(v) = self.short_break_minutes {
            settings.short_break_minutes = v;
        }
        if let Some(v) = self.long_break_minutes {
            settings.long_break_minutes = v;
        }
        if let Some(v) = self.cycles_before_long_break {
            settings.cycles_before_long_break = v;
        }
        if let Some(v) = self.daily_goal_minutes {
            settings.daily_goal_minutes = v;
        }
        if let Some(v) = self.auto_start_breaks {
            settings.auto_start_breaks = v;
        }
        if let Some(v) = self.auto_start_focus {
            settings.auto_start_focus = v;
        }
        if let Some(v) = self.sound_enabled {
            settings.sound_enabled = v;
        }
        if let Some(v) = self.timer_strategy {
            settings.timer_strategy = v;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: String,
    pub target_type: GoalTargetType,
    pub target_value: i64,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPatch {
    pub title: Option<String>,
    pub target_type: Option<GoalTargetType>,
    pub target_value: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
