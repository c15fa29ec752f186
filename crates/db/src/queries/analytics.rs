//! Analytics aggregates: daily totals, streaks, summary, breakdowns.
//!
//! Only ended `focus` sessions count. A session is attributed to the UTC day
//! and hour it started in.

use crate::{Database, DbResult};
use chrono::NaiveDate;
use focusflow_core::{
    compute_streak, end_of_day, format_day, goal_progress, longest_streak, parse_day,
    start_of_day, trailing_window, DailyFocus, GoalProgress, STREAK_MIN_MINUTES,
};
use serde::Serialize;
use std::collections::HashMap;
use ts_rs::TS;

/// Focus totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub day: String,
    #[ts(type = "number")]
    pub minutes: i64,
    #[ts(type = "number")]
    pub sessions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct StreakInfo {
    pub current: u32,
    pub longest: u32,
    #[ts(type = "number")]
    pub today_minutes: i64,
    pub qualifies_today: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    #[ts(type = "number")]
    pub today_minutes: i64,
    #[ts(type = "number")]
    pub week_minutes: i64,
    #[ts(type = "number")]
    pub total_minutes: i64,
    #[ts(type = "number")]
    pub total_sessions: i64,
    #[ts(type = "number")]
    pub tasks_completed: i64,
    #[ts(type = "number")]
    pub tasks_open: i64,
    pub current_streak: u32,
    pub longest_streak: u32,
    #[ts(type = "number")]
    pub daily_goal_minutes: i64,
    pub daily_goal_progress: GoalProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct ProjectMinutes {
    /// Task project, or `(none)` for sessions without one.
    pub project: String,
    #[ts(type = "number")]
    pub minutes: i64,
    #[ts(type = "number")]
    pub sessions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct HourBucket {
    /// UTC hour of day, 0..=23.
    pub hour: u32,
    #[ts(type = "number")]
    pub minutes: i64,
    #[ts(type = "number")]
    pub sessions: i64,
}

pub const NO_PROJECT: &str = "(none)";

impl Database {
    /// Per-day focus totals for `[from, to]`, one entry per day including
    /// days with no activity.
    pub async fn daily_focus_totals(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<DailyTotal>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT date(started_at, 'unixepoch') AS day,
                   COALESCE(SUM(duration_seconds), 0) AS secs,
                   COUNT(*) AS sessions
            FROM focus_sessions
            WHERE user_id = ? AND session_type = 'focus' AND ended_at IS NOT NULL
              AND started_at BETWEEN ? AND ?
            GROUP BY day
            "#,
        )
        .bind(user_id)
        .bind(start_of_day(from))
        .bind(end_of_day(to))
        .fetch_all(self.pool())
        .await?;

        let by_day: HashMap<String, (i64, i64)> = rows
            .into_iter()
            .map(|(day, secs, sessions)| (day, (secs / 60, sessions)))
            .collect();

        Ok(from
            .iter_days()
            .take_while(|d| *d <= to)
            .map(|d| {
                let day = format_day(d);
                let (minutes, sessions) = by_day.get(&day).copied().unwrap_or((0, 0));
                DailyTotal {
                    day,
                    minutes,
                    sessions,
                }
            })
            .collect())
    }

    /// Every day the user has focus time on, with that day's minutes.
    pub async fn streak_days(&self, user_id: i64) -> DbResult<Vec<DailyFocus>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT date(started_at, 'unixepoch') AS day, COALESCE(SUM(duration_seconds), 0) AS secs
            FROM focus_sessions
            WHERE user_id = ? AND session_type = 'focus' AND ended_at IS NOT NULL
            GROUP BY day
            ORDER BY day DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|(day, secs)| -> DbResult<DailyFocus> {
                Ok(DailyFocus::new(parse_day(&day)?, secs / 60))
            })
            .collect()
    }

    pub async fn streak(&self, user_id: i64, today: NaiveDate) -> DbResult<StreakInfo> {
        let days = self.streak_days(user_id).await?;
        let today_minutes = days
            .iter()
            .find(|d| d.day == today)
            .map(|d| d.minutes)
            .unwrap_or(0);
        Ok(StreakInfo {
            current: compute_streak(&days, today),
            longest: longest_streak(&days),
            today_minutes,
            qualifies_today: today_minutes >= STREAK_MIN_MINUTES,
        })
    }

    pub async fn analytics_summary(&self, user_id: i64, today: NaiveDate) -> DbResult<AnalyticsSummary> {
        let streak = self.streak(user_id, today).await?;
        let (week_start, _) = trailing_window(today, 7);
        let week = self.daily_focus_totals(user_id, week_start, today).await?;
        let week_minutes = week.iter().map(|d| d.minutes).sum();

        let (total_secs, total_sessions): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(duration_seconds), 0), COUNT(*)
            FROM focus_sessions
            WHERE user_id = ? AND session_type = 'focus' AND ended_at IS NOT NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;

        let (tasks_completed, tasks_open): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(completed = 1), 0), COALESCE(SUM(completed = 0), 0)
            FROM tasks WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;

        let daily_goal_minutes = self.get_user_settings(user_id).await?.daily_goal_minutes;

        Ok(AnalyticsSummary {
            today_minutes: streak.today_minutes,
            week_minutes,
            total_minutes: total_secs / 60,
            total_sessions,
            tasks_completed,
            tasks_open,
            current_streak: streak.current,
            longest_streak: streak.longest,
            daily_goal_minutes,
            daily_goal_progress: goal_progress(daily_goal_minutes, streak.today_minutes),
        })
    }

    /// Focus minutes per task project in `[from, to]`, largest first.
    pub async fn project_breakdown(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<ProjectMinutes>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT COALESCE(NULLIF(t.project, ''), ?) AS project,
                   COALESCE(SUM(fs.duration_seconds), 0) AS secs,
                   COUNT(*) AS sessions
            FROM focus_sessions fs
            LEFT JOIN tasks t ON t.id = fs.task_id
            WHERE fs.user_id = ? AND fs.session_type = 'focus' AND fs.ended_at IS NOT NULL
              AND fs.started_at BETWEEN ? AND ?
            GROUP BY 1
            ORDER BY secs DESC, project
            "#,
        )
        .bind(NO_PROJECT)
        .bind(user_id)
        .bind(start_of_day(from))
        .bind(end_of_day(to))
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(project, secs, sessions)| ProjectMinutes {
                project,
                minutes: secs / 60,
                sessions,
            })
            .collect())
    }

    /// Focus minutes by UTC start hour in `[from, to]`, always 24 buckets.
    pub async fn hourly_distribution(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<HourBucket>> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT CAST(strftime('%H', started_at, 'unixepoch') AS INTEGER) AS hour,
                   COALESCE(SUM(duration_seconds), 0) AS secs,
                   COUNT(*) AS sessions
            FROM focus_sessions
            WHERE user_id = ? AND session_type = 'focus' AND ended_at IS NOT NULL
              AND started_at BETWEEN ? AND ?
            GROUP BY hour
            "#,
        )
        .bind(user_id)
        .bind(start_of_day(from))
        .bind(end_of_day(to))
        .fetch_all(self.pool())
        .await?;

        let mut buckets: Vec<HourBucket> = (0..24)
            .map(|hour| HourBucket {
                hour,
                minutes: 0,
                sessions: 0,
            })
            .collect();
        for (hour, secs, sessions) in rows {
            if let Some(bucket) = usize::try_from(hour).ok().and_then(|h| buckets.get_mut(h)) {
                bucket.minutes = secs / 60;
                bucket.sessions = sessions;
            }
        }
        Ok(buckets)
    }
}
