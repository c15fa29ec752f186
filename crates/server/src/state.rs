// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use focusflow_db::Database;

use crate::config::AuthConfig;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Database handle; the pool is shared across handlers.
    pub db: Database,
    /// Session lifetime, signup policy and cookie flags.
    pub auth: AuthConfig,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(db: Database, auth: AuthConfig) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            auth,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
