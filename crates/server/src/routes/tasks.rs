// crates/server/src/routes/tasks.rs
//! Task board endpoints.
//!
//! - GET    /tasks?completed=&project=&tag=
//! - POST   /tasks
//! - GET    /tasks/{id}
//! - PATCH  /tasks/{id}
//! - DELETE /tasks/{id}
//! - POST   /tasks/reorder   `{ "ids": [..] }`

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use focusflow_core::{validate, NewTask, Task, TaskFilter, TaskPatch};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i64>,
}

/// GET /api/tasks
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.db.list_tasks(current.id(), &filter).await?;
    Ok(Json(tasks))
}

/// POST /api/tasks
async fn create_task(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(body): Json<NewTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = validate::new_task(body)?;
    let task = state.db.create_task(current.id(), &task).await?;
    tracing::debug!(task_id = task.id, user_id = current.id(), "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/{id}
async fn get_task(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Task>> {
    state
        .db
        .get_task(current.id(), id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Task", id))
}

/// PATCH /api/tasks/{id}
async fn update_task(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<TaskPatch>,
) -> ApiResult<Json<Task>> {
    let patch = validate::task_patch(body)?;
    state
        .db
        .update_task(current.id(), id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Task", id))
}

/// DELETE /api/tasks/{id}
async fn delete_task(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db.delete_task(current.id(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Task", id))
    }
}

/// POST /api/tasks/reorder
async fn reorder_tasks(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(body): Json<ReorderRequest>,
) -> ApiResult<StatusCode> {
    if body.ids.is_empty() {
        return Err(ApiError::BadRequest("ids must not be empty".into()));
    }
    let mut seen = std::collections::HashSet::new();
    if !body.ids.iter().all(|id| seen.insert(*id)) {
        return Err(ApiError::BadRequest("ids must not repeat".into()));
    }
    if state.db.reorder_tasks(current.id(), &body.ids).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::BadRequest("ids must all be your tasks".into()))
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/reorder", post(reorder_tasks))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
}
