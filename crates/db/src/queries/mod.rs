// crates/db/src/queries/mod.rs
// Typed queries for the FocusFlow SQLite database, one module per entity.

pub(crate) mod row_types;
pub mod admin;
pub mod analytics;
pub mod auth;
pub mod focus_sessions;
pub mod goals;
mod settings;
mod subtasks;
mod tasks;
pub mod users;

use chrono::Utc;

/// Current Unix time in seconds.
pub(crate) fn now_ts() -> i64 {
    Utc::now().timestamp()
}
