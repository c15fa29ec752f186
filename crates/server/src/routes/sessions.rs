// crates/server/src/routes/sessions.rs
//! Focus session endpoints.
//!
//! - GET    /sessions?from=YYYY-MM-DD&to=YYYY-MM-DD  (default: last 7 days)
//! - POST   /sessions                  - Start (ends any running session)
//! - GET    /sessions/active           - Running session or `null`
//! - POST   /sessions/{id}/end         - Optional body `{ "endedAt": <unix secs> }`
//! - DELETE /sessions/{id}
//! - GET    /tasks/{id}/sessions
//! - POST   /tasks/{id}/sessions/merge - Collapse contiguous focus sessions

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use focusflow_core::{
    end_of_day, start_of_day, today_utc, trailing_window, validate, FocusSession,
    NewFocusSession, ValidationError,
};
use focusflow_db::MergeReport;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Longest range `GET /sessions` serves in one call.
const MAX_RANGE_DAYS: i64 = 366;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    pub ended_at: Option<i64>,
}

fn resolve_range(q: &RangeQuery) -> Result<(i64, i64), ValidationError> {
    let (default_from, default_to) = trailing_window(today_utc(), 7);
    let to = match q.to.as_deref() {
        Some(raw) => validate::day("to", raw)?,
        None => default_to,
    };
    let from = match q.from.as_deref() {
        Some(raw) => validate::day("from", raw)?,
        None if q.to.is_some() => trailing_window(to, 7).0,
        None => default_from,
    };
    if from > to {
        return Err(ValidationError::new("to", "must not be before from"));
    }
    if (to - from).num_days() >= MAX_RANGE_DAYS {
        return Err(ValidationError::new(
            "from",
            format!("range must be at most {MAX_RANGE_DAYS} days"),
        ));
    }
    Ok((start_of_day(from), end_of_day(to)))
}

/// GET /api/sessions
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(q): Query<RangeQuery>,
) -> ApiResult<Json<Vec<FocusSession>>> {
    let (from, to) = resolve_range(&q)?;
    Ok(Json(state.db.list_sessions(current.id(), from, to).await?))
}

/// POST /api/sessions
async fn start_session(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(body): Json<NewFocusSession>,
) -> ApiResult<(StatusCode, Json<FocusSession>)> {
    if body.started_at.is_some_and(|t| t < 0) {
        return Err(ValidationError::new("startedAt", "must not be negative").into());
    }
    let session = state
        .db
        .start_session(current.id(), &body)
        .await?
        .ok_or_else(|| ApiError::not_found("Task", body.task_id.unwrap_or_default()))?;

    metrics::record_session_started(session.session_type);
    tracing::debug!(
        session_id = session.id,
        user_id = current.id(),
        session_type = session.session_type.as_str(),
        "Session started"
    );
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sessions/active
async fn active_session(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Option<FocusSession>>> {
    Ok(Json(state.db.active_session(current.id()).await?))
}

/// POST /api/sessions/{id}/end
///
/// Idempotent: ending an ended session returns it unchanged.
async fn end_session(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<Json<FocusSession>> {
    let request: EndSessionRequest = if body.is_empty() {
        EndSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    let before = state
        .db
        .get_session(current.id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Session", id))?;

    let session = state
        .db
        .end_session(current.id(), id, request.ended_at)
        .await?
        .ok_or_else(|| ApiError::not_found("Session", id))?;

    if before.is_active() {
        metrics::record_session_ended(session.session_type);
    }
    Ok(Json(session))
}

/// DELETE /api/sessions/{id}
async fn delete_session(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db.delete_session(current.id(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Session", id))
    }
}

/// GET /api/tasks/{id}/sessions
async fn task_sessions(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Vec<FocusSession>>> {
    state
        .db
        .list_task_sessions(current.id(), task_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Task", task_id))
}

/// POST /api/tasks/{id}/sessions/merge
async fn merge_task_sessions(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<MergeReport>> {
    let report = state
        .db
        .merge_contiguous_sessions(current.id(), task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task", task_id))?;
    if report.removed > 0 {
        metrics::record_merge(report.removed);
        tracing::info!(
            task_id,
            groups = report.groups,
            removed = report.removed,
            "Merged contiguous sessions"
        );
    }
    Ok(Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", get(list_sessions).post(start_session))
        .route("/sessions/active", get(active_session))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/end", post(end_session))
        .route("/tasks/{id}/sessions", get(task_sessions))
        .route("/tasks/{id}/sessions/merge", post(merge_task_sessions))
}
