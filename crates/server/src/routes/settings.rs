//! Per-user timer and goal settings.
//!
//! - GET /settings        - Current settings (defaults on first read)
//! - PUT /settings        - Partial update
//! - GET /settings/timer  - Timer config derived from settings, plus its idle state

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use focusflow_core::{validate, SettingsPatch, TimerConfig, TimerState, UserSettings};
use serde::Serialize;
use ts_rs::TS;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct TimerResponse {
    pub config: TimerConfig,
    /// State a freshly mounted timer starts in.
    pub initial: TimerState,
}

/// GET /api/settings - Read the user's settings.
async fn get_settings(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<UserSettings>> {
    Ok(Json(state.db.get_user_settings(current.id()).await?))
}

/// PUT /api/settings - Update settings (partial).
async fn update_settings(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Json(body): Json<SettingsPatch>,
) -> ApiResult<Json<UserSettings>> {
    validate::settings_patch(&body)?;
    let settings = state.db.update_user_settings(current.id(), &body).await?;
    tracing::debug!(user_id = current.id(), "Settings updated");
    Ok(Json(settings))
}

/// GET /api/settings/timer
async fn timer_config(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<TimerResponse>> {
    let settings = state.db.get_user_settings(current.id()).await?;
    let config = TimerConfig::from(&settings);
    Ok(Json(TimerResponse {
        initial: TimerState::new(&config),
        config,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/settings/timer", get(timer_config))
}
