// crates/server/src/config.rs
//! Server configuration.
//!
//! Loaded from TOML (`FOCUSFLOW_CONFIG`, else `./focusflow.toml` if present,
//! else built-in defaults), then overridden by `FOCUSFLOW_*` environment
//! variables.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 47900;

const DEFAULT_CONFIG_FILE: &str = "focusflow.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed browser origin. Unset means any origin (development).
    #[serde(default)]
    pub cors_origin: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file. Unset means `<data dir>/focusflow/focusflow.db`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u64,
    /// Allow the first account to sign up without a registration code.
    #[serde(default)]
    pub open_signup: bool,
    /// Mark auth cookies `Secure` (serve over HTTPS).
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Password for the bootstrap admin account. For security: prefer
    /// setting env var `FOCUSFLOW_ADMIN_PASSWORD`.
    #[serde(default)]
    pub admin_password: Option<String>,
}

fn default_session_ttl_hours() -> u64 {
    24 * 30
}

fn default_admin_username() -> String {
    "admin".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
            open_signup: false,
            secure_cookies: false,
            admin_username: default_admin_username(),
            admin_password: None,
        }
    }
}

impl AuthConfig {
    pub fn session_ttl_secs(&self) -> i64 {
        i64::try_from(self.session_ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX)
    }
}

impl AppConfig {
    /// Load from file (if any) and apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Apply `FOCUSFLOW_*` overrides. `lookup` is the environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(port) = lookup("FOCUSFLOW_PORT").or_else(|| lookup("PORT")) {
            self.server.port = port
                .parse()
                .with_context(|| format!("invalid port: {port}"))?;
        }
        if let Some(host) = lookup("FOCUSFLOW_BIND") {
            self.server.host = host;
        }
        if let Some(origin) = lookup("FOCUSFLOW_CORS_ORIGIN") {
            self.server.cors_origin = Some(origin);
        }
        if let Some(path) = lookup("FOCUSFLOW_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(password) = lookup("FOCUSFLOW_ADMIN_PASSWORD") {
            self.auth.admin_password = Some(password);
        }
        if let Some(flag) = lookup("FOCUSFLOW_OPEN_SIGNUP") {
            self.auth.open_signup = parse_flag(&flag)
                .with_context(|| format!("invalid FOCUSFLOW_OPEN_SIGNUP: {flag}"))?;
        }
        if let Some(hours) = lookup("FOCUSFLOW_SESSION_TTL_HOURS") {
            self.auth.session_ttl_hours = hours
                .parse()
                .with_context(|| format!("invalid FOCUSFLOW_SESSION_TTL_HOURS: {hours}"))?;
        }
        Ok(())
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("FOCUSFLOW_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
