// crates/server/src/lib.rs
//! FocusFlow server library.
//!
//! This crate provides the Axum-based HTTP server for FocusFlow: accounts and
//! sessions, tasks with subtasks, focus sessions, goals, analytics and the
//! admin console, all served as a JSON API under `/api`.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{AppConfig, AuthConfig, ServerConfig};
pub use error::*;
pub use metrics::{init_metrics, render_metrics};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes under `/api` and the Prometheus scrape endpoint
/// - Request metrics on every matched route
/// - CORS (any origin, or the configured one with credentials)
/// - Request tracing
pub fn create_app(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let metrics_routes = routes::metrics::router().with_state(state.clone());

    Router::new()
        .merge(api_routes(state))
        .merge(metrics_routes)
        .route_layer(axum::middleware::from_fn(metrics::track_metrics))
        .layer(cors_layer(server.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    };
    match HeaderValue::from_str(origin) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
        Err(e) => {
            tracing::warn!(origin, error = %e, "Invalid CORS origin, allowing any origin");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

// ============================================================================
// Integration Tests
// ============================================================================
