// crates/server/src/routes/goals.rs
//! Goal endpoints. `currentValue` and `progress` are recomputed from
//! sessions and tasks on every read.
//!
//! - GET    /goals
//! - POST   /goals
//! - GET    /goals/{id}
//! - PATCH  /goals/{id}
//! - DELETE /goals/{id}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use focusflow_core::{validate, Goal, GoalPatch, NewGoal};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

async fn list_goals(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<Goal>>> {
    Ok(Json(state.db.list_goals(current.id()).await?))
}

async fn create_goal(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(body): Json<NewGoal>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let goal = validate::new_goal(&body)?;
    let goal = state.db.create_goal(current.id(), &goal).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn get_goal(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Goal>> {
    state
        .db
        .get_goal(current.id(), id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Goal", id))
}

async fn update_goal(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<GoalPatch>,
) -> ApiResult<Json<Goal>> {
    let existing = state
        .db
        .get_goal(current.id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Goal", id))?;
    let patch = validate::goal_patch(&body, &existing.start_date, &existing.end_date)?;
    state
        .db
        .update_goal(current.id(), id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Goal", id))
}

async fn delete_goal(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.db.delete_goal(current.id(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Goal", id))
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/goals", get(list_goals).post(create_goal))
        .route(
            "/goals/{id}",
            get(get_goal).patch(update_goal).delete(delete_goal),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_app, send, signed_in, test_state};
    use axum::http::Method;
    use serde_json::json;

    fn goal_body() -> serde_json::Value {
        json!({
            "title": "  Ship v1 ",
            "targetType": "tasks_completed",
            "targetValue": 4,
            "startDate": "2025-03-01",
            "endDate": "2025-03-31"
        })
    }

    #[tokio::test]
    async fn test_goal_crud() {
        let state = test_state().await;
        let (_, cookie) = signed_in(&state, "g@example.com").await;
        let app = build_app(state, router());

        let (status, goal) = send(app.clone(), Method::POST, "/api/goals", Some(&cookie), Some(goal_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(goal["title"], "Ship v1");
        assert_eq!(goal["currentValue"], 0);
        assert_eq!(goal["progress"]["completed"], false);

        let uri = format!("/api/goals/{}", goal["id"]);
        let (status, patched) = send(
            app.clone(),
            Method::PATCH,
            &uri,
            Some(&cookie),
            Some(json!({"endDate": "2025-04-15", "targetValue": 8})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["endDate"], "2025-04-15");
        assert_eq!(patched["targetValue"], 8);
        assert_eq!(patched["startDate"], "2025-03-01");

        let (_, listed) = send(app.clone(), Method::GET, "/api/goals", Some(&cookie), None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, _) = send(app.clone(), Method::DELETE, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(app, Method::GET, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Goal not found");
    }

    #[tokio::test]
    async fn test_goal_validation() {
        let state = test_state().await;
        let (_, cookie) = signed_in(&state, "g@example.com").await;
        let app = build_app(state, router());

        let mut bad = goal_body();
        bad["targetValue"] = json!(0);
        let (status, body) = send(app.clone(), Method::POST, "/api/goals", Some(&cookie), Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().starts_with("targetValue"));

        let (_, goal) = send(app.clone(), Method::POST, "/api/goals", Some(&cookie), Some(goal_body())).await;
        let uri = format!("/api/goals/{}", goal["id"]);
        let (status, body) = send(
            app,
            Method::PATCH,
            &uri,
            Some(&cookie),
            Some(json!({"endDate": "2025-02-01"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().starts_with("endDate"));
    }

    #[tokio::test]
    async fn test_goals_are_private() {
        let state = test_state().await;
        let (_, owner) = signed_in(&state, "owner@example.com").await;
        let (_, other) = signed_in(&state, "other@example.com").await;
        let app = build_app(state, router());
        let (_, goal) = send(app.clone(), Method::POST, "/api/goals", Some(&owner), Some(goal_body())).await;
        let uri = format!("/api/goals/{}", goal["id"]);

        let (status, _) = send(app.clone(), Method::PATCH, &uri, Some(&other), Some(json!({"title": "mine"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, listed) = send(app, Method::GET, "/api/goals", Some(&other), None).await;
        assert_eq!(listed, json!([]));
    }
}
