// crates/core/src/validate.rs
//! Request validation shared by the HTTP handlers.
//!
//! Each function returns the normalized value (trimmed, deduplicated) so
//! handlers store exactly what was checked.

use chrono::NaiveDate;

use crate::calendar::{format_day, parse_day};
use crate::error::ValidationError;
use crate::types::{GoalPatch, NewGoal, NewSubtask, NewTask, SettingsPatch, SubtaskPatch, TaskPatch};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 10_000;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LEN: usize = 32;
pub const MAX_PROJECT_LEN: usize = 100;
pub const MAX_MINUTES: i64 = 24 * 60;
pub const MIN_PASSWORD_LEN: usize = 8;

type Result<T> = std::result::Result<T, ValidationError>;

pub fn title(field: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::new(
            field,
            format!("must be at most {MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn description(raw: &str) -> Result<String> {
    if raw.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::new(
            "description",
            format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(raw.to_string())
}

pub fn minutes(field: &'static str, value: i64) -> Result<i64> {
    if !(0..=MAX_MINUTES).contains(&value) {
        return Err(ValidationError::new(
            field,
            format!("must be between 0 and {MAX_MINUTES}"),
        ));
    }
    Ok(value)
}

/// Empty or whitespace-only projects are stored as "no project".
pub fn project(raw: Option<&str>) -> Result<Option<String>> {
    let Some(p) = raw.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    if p.chars().count() > MAX_PROJECT_LEN {
        return Err(ValidationError::new(
            "project",
            format!("must be at most {MAX_PROJECT_LEN} characters"),
        ));
    }
    Ok(Some(p.to_string()))
}

/// Trim, drop empties, deduplicate case-insensitively (first spelling wins).
pub fn tags(raw: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for tag in raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(ValidationError::new(
                "tags",
                format!("each tag must be at most {MAX_TAG_LEN} characters"),
            ));
        }
        if !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    if out.len() > MAX_TAGS {
        return Err(ValidationError::new(
            "tags",
            format!("at most {MAX_TAGS} tags allowed"),
        ));
    }
    Ok(out)
}

pub fn day(field: &'static str, raw: &str) -> Result<NaiveDate> {
    parse_day(raw).map_err(|_| ValidationError::new(field, "must be a YYYY-MM-DD date"))
}

/// Optional due date: blank means none.
pub fn due_date(raw: Option<&str>) -> Result<Option<String>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => day("dueDate", s).map(|d| Some(format_day(d))),
        None => Ok(None),
    }
}

pub fn email(raw: &str) -> Result<String> {
    let e = raw.trim().to_lowercase();
    let valid = e.len() <= 254
        && e.split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !valid {
        return Err(ValidationError::new("email", "must be a valid email address"));
    }
    Ok(e)
}

pub fn password(raw: &str) -> Result<()> {
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn registration_code(raw: &str) -> Result<String> {
    let code = raw.trim();
    let valid_len = (6..=64).contains(&code.len());
    let valid_chars = code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid_len || !valid_chars {
        return Err(ValidationError::new(
            "code",
            "must be 6-64 characters of letters, digits or '-'",
        ));
    }
    Ok(code.to_string())
}

fn in_range(field: &'static str, value: Option<i64>, min: i64, max: i64) -> Result<()> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(ValidationError::new(
            field,
            format!("must be between {min} and {max}"),
        )),
        _ => Ok(()),
    }
}

pub fn settings_patch(patch: &SettingsPatch) -> Result<()> {
    in_range("focusMinutes", patch.focus_minutes, 1, 180)?;
    in_range("shortBreakMinutes", patch.short_break_minutes, 1, 60)?;
    in_range("longBreakMinutes", patch.long_break_minutes, 1, 60)?;
    in_range("cyclesBeforeLongBreak", patch.cycles_before_long_break, 1, 12)?;
    in_range("dailyGoalMinutes", patch.daily_goal_minutes, 0, MAX_MINUTES)?;
    Ok(())
}

fn goal_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate)> {
    let start = day("startDate", start)?;
    let end = day("endDate", end)?;
    if start > end {
        return Err(ValidationError::new("endDate", "must not be before startDate"));
    }
    Ok((start, end))
}

fn goal_target(value: i64) -> Result<()> {
    if value <= 0 {
        return Err(ValidationError::new("targetValue", "must be greater than 0"));
    }
    Ok(())
}

pub fn new_goal(goal: &NewGoal) -> Result<NewGoal> {
    let title = title("title", &goal.title)?;
    goal_target(goal.target_value)?;
    let (start, end) = goal_range(&goal.start_date, &goal.end_date)?;
    Ok(NewGoal {
        title,
        target_type: goal.target_type,
        target_value: goal.target_value,
        start_date: format_day(start),
        end_date: format_day(end),
    })
}

/// Validate a patch against the goal's current dates so a range can be
/// changed one end at a time.
pub fn goal_patch(patch: &GoalPatch, current_start: &str, current_end: &str) -> Result<GoalPatch> {
    let title = patch.title.as_deref().map(|t| title("title", t)).transpose()?;
    if let Some(v) = patch.target_value {
        goal_target(v)?;
    }
    let start = patch.start_date.as_deref().unwrap_or(current_start);
    let end = patch.end_date.as_deref().unwrap_or(current_end);
    let (start, end) = goal_range(start, end)?;
    Ok(GoalPatch {
        title,
        target_type: patch.target_type,
        target_value: patch.target_value,
        start_date: patch.start_date.as_ref().map(|_| format_day(start)),
        end_date: patch.end_date.as_ref().map(|_| format_day(end)),
    })
}

fn actual_minutes(value: i64) -> Result<i64> {
    if value < 0 {
        return Err(ValidationError::new("actualMinutes", "must not be negative"));
    }
    Ok(value)
}

/// Normalize a new task: trimmed title, deduplicated tags, canonical due date.
pub fn new_task(task: NewTask) -> Result<NewTask> {
    Ok(NewTask {
        title: title("title", &task.title)?,
        description: description(&task.description)?,
        priority: task.priority,
        estimated_minutes: task
            .estimated_minutes
            .map(|m| minutes("estimatedMinutes", m))
            .transpose()?,
        due_date: due_date(task.due_date.as_deref())?,
        project: project(task.project.as_deref())?,
        tags: tags(&task.tags)?,
    })
}

pub fn task_patch(patch: TaskPatch) -> Result<TaskPatch> {
    Ok(TaskPatch {
        title: patch.title.map(|t| title("title", &t)).transpose()?,
        description: patch.description.map(|d| description(&d)).transpose()?,
        priority: patch.priority,
        estimated_minutes: patch
            .estimated_minutes
            .map(|m| m.map(|m| minutes("estimatedMinutes", m)).transpose())
            .transpose()?,
        actual_minutes: patch.actual_minutes.map(actual_minutes).transpose()?,
        completed: patch.completed,
        due_date: patch
            .due_date
            .map(|d| due_date(d.as_deref()))
            .transpose()?,
        project: patch.project.map(|p| project(p.as_deref())).transpose()?,
        tags: patch.tags.map(|t| tags(&t)).transpose()?,
        position: patch.position,
    })
}

pub fn new_subtask(subtask: NewSubtask) -> Result<NewSubtask> {
    Ok(NewSubtask {
        title: title("title", &subtask.title)?,
        description: description(&subtask.description)?,
        priority: subtask.priority,
        estimated_minutes: subtask
            .estimated_minutes
            .map(|m| minutes("estimatedMinutes", m))
            .transpose()?,
    })
}

pub fn subtask_patch(patch: SubtaskPatch) -> Result<SubtaskPatch> {
    Ok(SubtaskPatch {
        title: patch.title.map(|t| title("title", &t)).transpose()?,
        description: patch.description.map(|d| description(&d)).transpose()?,
        priority: patch.priority,
        estimated_minutes: patch
            .estimated_minutes
            .map(|m| m.map(|m| minutes("estimatedMinutes", m)).transpose())
            .transpose()?,
        actual_minutes: patch.actual_minutes.map(actual_minutes).transpose()?,
        completed: patch.completed,
        position: patch.position,
    })
}
