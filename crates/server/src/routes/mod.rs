//! API route handlers for the FocusFlow server.

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod goals;
pub mod health;
pub mod metrics;
pub mod sessions;
pub mod settings;
pub mod subtasks;
pub mod tasks;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check
/// - POST /api/auth/signup, /api/auth/login, /api/auth/logout; GET /api/auth/me
/// - GET|POST /api/tasks; GET|PATCH|DELETE /api/tasks/{id}; POST /api/tasks/reorder
/// - GET|POST /api/tasks/{id}/subtasks; PATCH|DELETE /api/subtasks/{id}
/// - GET|POST /api/sessions; GET /api/sessions/active; POST /api/sessions/{id}/end
/// - DELETE /api/sessions/{id}; GET /api/tasks/{id}/sessions
/// - POST /api/tasks/{id}/sessions/merge - Merge focus sessions less than 90 s apart
/// - GET|PUT /api/settings; GET /api/settings/timer
/// - GET|POST /api/goals; GET|PATCH|DELETE /api/goals/{id}
/// - GET /api/analytics/{summary,daily,streak,projects,hours}
/// - POST /api/admin/login, /api/admin/logout; GET /api/admin/me, /api/admin/overview
/// - GET /api/admin/users; PATCH|DELETE /api/admin/users/{id}
/// - GET /api/admin/tasks; DELETE /api/admin/tasks/{id}
/// - GET|POST /api/admin/codes; DELETE /api/admin/codes/{id}
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_router())
        .with_state(state)
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(tasks::router())
        .merge(subtasks::router())
        .merge(sessions::router())
        .merge(settings::router())
        .merge(goals::router())
        .merge(analytics::router())
        .merge(admin::router())
}
