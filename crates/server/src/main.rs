// crates/server/src/main.rs
//! FocusFlow server binary.
//!
//! Loads configuration, opens the database, makes sure the admin account
//! exists, then serves the API. Expired sessions are purged hourly.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use focusflow_db::Database;
use focusflow_server::{auth::bootstrap_admin, create_app, init_metrics, AppConfig, AppState};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,focusflow_server=info,focusflow_db=info";
const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("FOCUSFLOW_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Periodically drop expired user and admin sessions.
fn spawn_session_purge(db: Database) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match db.purge_expired_sessions(chrono::Utc::now().timestamp()).await {
                Ok(0) => tracing::debug!("Session purge: nothing expired"),
                Ok(n) => tracing::info!(removed = n, "Purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session purge failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;

    if !init_metrics() {
        tracing::warn!("Prometheus recorder already installed; /metrics may be empty");
    }

    let db = match &config.database.path {
        Some(path) => Database::new(path).await,
        None => Database::open_default().await,
    }
    .context("opening database")?;

    bootstrap_admin(&db, &config.auth).await?;

    spawn_session_purge(db.clone());

    let state = AppState::new(db, config.auth.clone());
    let app = create_app(state, &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.host))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "FocusFlow listening");
    eprintln!("\n  FocusFlow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("  \u{2192} http://{addr}\n");

    axum::serve(listener, app).await?;

    Ok(())
}
