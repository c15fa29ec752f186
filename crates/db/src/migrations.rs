/// Inline SQL migrations for the FocusFlow schema.
///
/// One statement per entry; the index (1-based) is the migration version.
/// Append only: never edit or reorder an entry that has shipped.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: accounts
    r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    display_name  TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    plan          TEXT NOT NULL DEFAULT 'free',
    disabled      INTEGER NOT NULL DEFAULT 0,
    created_at    INTEGER NOT NULL
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS auth_sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_auth_sessions_expiry ON auth_sessions(expires_at);"#,
    // Migration 4: tasks + subtasks
    r#"
CREATE TABLE IF NOT EXISTS tasks (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title             TEXT NOT NULL,
    description       TEXT NOT NULL DEFAULT '',
    priority          TEXT NOT NULL DEFAULT 'medium',
    estimated_minutes INTEGER,
    actual_minutes    INTEGER NOT NULL DEFAULT 0,
    completed         INTEGER NOT NULL DEFAULT 0,
    completed_at      INTEGER,
    due_date          TEXT,
    project           TEXT,
    tags              TEXT NOT NULL DEFAULT '[]',
    position          INTEGER NOT NULL DEFAULT 0,
    created_at        INTEGER NOT NULL,
    updated_at        INTEGER NOT NULL
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id, completed, position);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_tasks_completed_at ON tasks(user_id, completed_at);"#,
    r#"
CREATE TABLE IF NOT EXISTS subtasks (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id           INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    title             TEXT NOT NULL,
    description       TEXT NOT NULL DEFAULT '',
    priority          TEXT NOT NULL DEFAULT 'medium',
    estimated_minutes INTEGER,
    actual_minutes    INTEGER NOT NULL DEFAULT 0,
    completed         INTEGER NOT NULL DEFAULT 0,
    position          INTEGER NOT NULL DEFAULT 0,
    created_at        INTEGER NOT NULL,
    updated_at        INTEGER NOT NULL
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_subtasks_task ON subtasks(task_id, position);"#,
    // Migration 9: focus sessions
    r#"
CREATE TABLE IF NOT EXISTS focus_sessions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    task_id          INTEGER REFERENCES tasks(id) ON DELETE SET NULL,
    session_type     TEXT NOT NULL DEFAULT 'focus',
    timer_strategy   TEXT NOT NULL DEFAULT 'pomodoro',
    started_at       INTEGER NOT NULL,
    ended_at         INTEGER,
    duration_seconds INTEGER
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_focus_sessions_user_start ON focus_sessions(user_id, started_at);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_focus_sessions_task_start ON focus_sessions(task_id, started_at);"#,
    r#"CREATE INDEX IF NOT EXISTS idx_focus_sessions_active ON focus_sessions(user_id) WHERE ended_at IS NULL;"#,
    // Migration 13: per-user settings
    r#"
CREATE TABLE IF NOT EXISTS user_settings (
    user_id                  INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    focus_minutes            INTEGER NOT NULL DEFAULT 25,
    short_break_minutes      INTEGER NOT NULL DEFAULT 5,
    long_break_minutes       INTEGER NOT NULL DEFAULT 15,
    cycles_before_long_break INTEGER NOT NULL DEFAULT 4,
    daily_goal_minutes       INTEGER NOT NULL DEFAULT 120,
    auto_start_breaks        INTEGER NOT NULL DEFAULT 0,
    auto_start_focus         INTEGER NOT NULL DEFAULT 0,
    sound_enabled            INTEGER NOT NULL DEFAULT 1,
    timer_strategy           TEXT NOT NULL DEFAULT 'pomodoro'
);
"#,
    // Migration 14: goals
    r#"
CREATE TABLE IF NOT EXISTS goals (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title        TEXT NOT NULL,
    target_type  TEXT NOT NULL,
    target_value INTEGER NOT NULL,
    start_date   TEXT NOT NULL,
    end_date     TEXT NOT NULL,
    created_at   INTEGER NOT NULL
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id);"#,
    // Migration 16: admin console
    r#"
CREATE TABLE IF NOT EXISTS admin_users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    INTEGER NOT NULL
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS admin_sessions (
    token_hash TEXT PRIMARY KEY,
    admin_id   INTEGER NOT NULL REFERENCES admin_users(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);
"#,
    r#"
CREATE TABLE IF NOT EXISTS registration_codes (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    code       TEXT NOT NULL UNIQUE,
    max_uses   INTEGER NOT NULL DEFAULT 1,
    uses       INTEGER NOT NULL DEFAULT 0,
    expires_at INTEGER,
    created_at INTEGER NOT NULL,
    created_by INTEGER REFERENCES admin_users(id) ON DELETE SET NULL
);
"#,
];
