// crates/server/src/routes/analytics.rs
//! Analytics endpoints. Windows are trailing UTC days ending today.
//!
//! - GET /analytics/summary
//! - GET /analytics/daily?days=N     (1..=366, default 30)
//! - GET /analytics/streak
//! - GET /analytics/projects?days=N
//! - GET /analytics/hours?days=N

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use focusflow_core::{today_utc, trailing_window, ValidationError};
use focusflow_db::{AnalyticsSummary, DailyTotal, HourBucket, ProjectMinutes, StreakInfo};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_DAYS: u32 = 30;
const MAX_DAYS: u32 = 366;

#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<u32>,
}

impl DaysQuery {
    fn window(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ValidationError> {
        let days = self.days.unwrap_or(DEFAULT_DAYS);
        if !(1..=MAX_DAYS).contains(&days) {
            return Err(ValidationError::new(
                "days",
                format!("must be between 1 and {MAX_DAYS}"),
            ));
        }
        Ok(trailing_window(today, days))
    }
}

async fn summary(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<AnalyticsSummary>> {
    Ok(Json(
        state.db.analytics_summary(current.id(), today_utc()).await?,
    ))
}

async fn daily(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(q): Query<DaysQuery>,
) -> ApiResult<Json<Vec<DailyTotal>>> {
    let (from, to) = q.window(today_utc())?;
    Ok(Json(state.db.daily_focus_totals(current.id(), from, to).await?))
}

async fn streak(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<StreakInfo>> {
    Ok(Json(state.db.streak(current.id(), today_utc()).await?))
}

async fn projects(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(q): Query<DaysQuery>,
) -> ApiResult<Json<Vec<ProjectMinutes>>> {
    let (from, to) = q.window(today_utc())?;
    Ok(Json(state.db.project_breakdown(current.id(), from, to).await?))
}

async fn hours(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(q): Query<DaysQuery>,
) -> ApiResult<Json<Vec<HourBucket>>> {
    let (from, to) = q.window(today_utc())?;
    Ok(Json(state.db.hourly_distribution(current.id(), from, to).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analytics/summary", get(summary))
        .route("/analytics/daily", get(daily))
        .route("/analytics/streak", get(streak))
        .route("/analytics/projects", get(projects))
        .route("/analytics/hours", get(hours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_app, send, signed_in, test_state};
    use axum::http::{Method, StatusCode};
    use focusflow_core::{start_of_day, NewFocusSession, NewTask};

    async fn focus(state: &AppState, user_id: i64, task_id: Option<i64>, start: i64, minutes: i64) {
        let s = state
            .db
            .start_session(
                user_id,
                &NewFocusSession {
                    task_id,
                    started_at: Some(start),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        state
            .db
            .end_session(user_id, s.id, Some(start + minutes * 60))
            .await
            .unwrap();
    }

    #[test]
    fn test_days_window_bounds() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (from, to) = DaysQuery::default().window(today).unwrap();
        assert_eq!(to, today);
        assert_eq!((to - from).num_days(), 29);

        let one = DaysQuery { days: Some(1) };
        assert_eq!(one.window(today).unwrap(), (today, today));

        assert!(DaysQuery { days: Some(0) }.window(today).is_err());
        assert!(DaysQuery { days: Some(367) }.window(today).is_err());
        assert!(DaysQuery { days: Some(366) }.window(today).is_ok());
    }

    #[tokio::test]
    async fn test_streak_and_summary_today() {
        let state = test_state().await;
        let (user, cookie) = signed_in(&state, "a@example.com").await;
        let today = start_of_day(today_utc());
        focus(&state, user.id, None, today - 2 * 86_400 + 3600, 30).await;
        focus(&state, user.id, None, today - 86_400 + 3600, 25).await;
        focus(&state, user.id, None, today + 60, 10).await;
        focus(&state, user.id, None, today + 3600, 20).await;
        let app = build_app(state, router());

        let (status, streak) = send(app.clone(), Method::GET, "/api/analytics/streak", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(streak["current"], 3);
        assert_eq!(streak["todayMinutes"], 30);
        assert_eq!(streak["qualifiesToday"], true);

        let (_, summary) = send(app, Method::GET, "/api/analytics/summary", Some(&cookie), None).await;
        assert_eq!(summary["todayMinutes"], 30);
        assert_eq!(summary["weekMinutes"], 85);
        assert_eq!(summary["totalSessions"], 4);
        assert_eq!(summary["currentStreak"], 3);
        assert_eq!(summary["dailyGoalMinutes"], 120);
        assert_eq!(summary["dailyGoalProgress"]["percent"], 25.0);
    }

    #[tokio::test]
    async fn test_daily_projects_hours() {
        let state = test_state().await;
        let (user, cookie) = signed_in(&state, "a@example.com").await;
        let task = state
            .db
            .create_task(
                user.id,
                &NewTask {
                    title: "Report".into(),
                    project: Some("Work".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let today = start_of_day(today_utc());
        focus(&state, user.id, Some(task.id), today + 9 * 3600, 40).await;
        focus(&state, user.id, None, today + 14 * 3600, 15).await;
        let app = build_app(state, router());

        let (_, daily) = send(app.clone(), Method::GET, "/api/analytics/daily?days=7", Some(&cookie), None).await;
        let daily = daily.as_array().unwrap();
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[6]["minutes"], 55);
        assert_eq!(daily[0]["minutes"], 0);

        let (_, projects) = send(app.clone(), Method::GET, "/api/analytics/projects?days=1", Some(&cookie), None).await;
        assert_eq!(projects[0]["project"], "Work");
        assert_eq!(projects[0]["minutes"], 40);
        assert_eq!(projects[1]["project"], focusflow_db::NO_PROJECT);

        let (_, hours) = send(app.clone(), Method::GET, "/api/analytics/hours", Some(&cookie), None).await;
        assert_eq!(hours.as_array().unwrap().len(), 24);
        assert_eq!(hours[9]["minutes"], 40);
        assert_eq!(hours[14]["sessions"], 1);

        let (status, body) = send(app, Method::GET, "/api/analytics/daily?days=0", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().starts_with("days"));
    }
}
