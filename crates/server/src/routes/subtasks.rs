// crates/server/src/routes/subtasks.rs
//! Subtask endpoints. Ownership is checked through the parent task.
//!
//! - GET    /tasks/{id}/subtasks
//! - POST   /tasks/{id}/subtasks
//! - PATCH  /subtasks/{id}
//! - DELETE /subtasks/{id}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use focusflow_core::{validate, NewSubtask, Subtask, SubtaskPatch};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

async fn list_subtasks(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Vec<Subtask>>> {
    state
        .db
        .list_subtasks(current.id(), task_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Task", task_id))
}

async fn create_subtask(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(task_id): Path<i64>,
    Json(body): Json<NewSubtask>,
) -> ApiResult<(StatusCode, Json<Subtask>)> {
    let subtask = validate::new_subtask(body)?;
    state
        .db
        .create_subtask(current.id(), task_id, &subtask)
        .await?
        .map(|s| (StatusCode::CREATED, Json(s)))
        .ok_or_else(|| ApiError::not_found("Task", task_id))
}

async fn update_subtask(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<SubtaskPatch>,
) -> ApiResult<Json<Subtask>> {
    let patch = validate::subtask_patch(body)?;
    state
        .db
        .update_subtask(current.id(), id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Subtask", id))
}

async fn delete_subtask(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db.delete_subtask(current.id(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Subtask", id))
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/tasks/{id}/subtasks",
            get(list_subtasks).post(create_subtask),
        )
        .route("/subtasks/{id}", patch(update_subtask).delete(delete_subtask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_app, send, signed_in, test_state};
    use axum::http::Method;
    use focusflow_core::NewTask;
    use serde_json::json;

    #[tokio::test]
    async fn test_subtask_lifecycle() {
        let state = test_state().await;
        let (user, cookie) = signed_in(&state, "s@example.com").await;
        let task = state
            .db
            .create_task(
                user.id,
                &NewTask {
                    title: "Parent".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let app = build_app(state.clone(), router());
        let list_uri = format!("/api/tasks/{}/subtasks", task.id);

        let (status, first) = send(
            app.clone(),
            Method::POST,
            &list_uri,
            Some(&cookie),
            Some(json!({"title": " Outline ", "estimatedMinutes": 15})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["title"], "Outline");
        assert_eq!(first["taskId"], task.id);

        send(app.clone(), Method::POST, &list_uri, Some(&cookie), Some(json!({"title": "Draft"}))).await;

        let sub_uri = format!("/api/subtasks/{}", first["id"]);
        let (status, done) = send(
            app.clone(),
            Method::PATCH,
            &sub_uri,
            Some(&cookie),
            Some(json!({"completed": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["completed"], true);

        let (_, listed) = send(app.clone(), Method::GET, &list_uri, Some(&cookie), None).await;
        assert_eq!(listed.as_array().unwrap().len(), 2);

        let parent = state.db.get_task(user.id, task.id).await.unwrap().unwrap();
        assert_eq!(parent.subtask_count, 2);
        assert_eq!(parent.subtasks_completed, 1);

        let (status, _) = send(app.clone(), Method::DELETE, &sub_uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(app, Method::DELETE, &sub_uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_foreign_parent_is_404() {
        let state = test_state().await;
        let (owner, _) = signed_in(&state, "owner@example.com").await;
        let (_, intruder) = signed_in(&state, "intruder@example.com").await;
        let task = state
            .db
            .create_task(
                owner.id,
                &NewTask {
                    title: "Mine".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let app = build_app(state, router());
        let uri = format!("/api/tasks/{}/subtasks", task.id);

        let (status, body) = send(app.clone(), Method::GET, &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Task not found");

        let (status, _) = send(app, Method::POST, &uri, Some(&intruder), Some(json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
