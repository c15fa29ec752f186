//! Per-user timer and goal settings.

use super::row_types::SettingsRow;
use crate::{Database, DbResult};
use focusflow_core::{SettingsPatch, UserSettings};

const SETTINGS_COLUMNS: &str = "focus_minutes, short_break_minutes, long_break_minutes, \
     cycles_before_long_break, daily_goal_minutes, auto_start_breaks, auto_start_focus, \
     sound_enabled, timer_strategy";

impl Database {
    /// Read a user's settings, creating the default row on first access.
    pub async fn get_user_settings(&self, user_id: i64) -> DbResult<UserSettings> {
        sqlx::query("INSERT OR IGNORE INTO user_settings (user_id) VALUES (?)")
            .bind(user_id)
            .execute(self.pool())
            .await?;
        let row: SettingsRow = sqlx::query_as(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM user_settings WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;
        Ok(row.0)
    }

    /// Update settings (partial: only provided fields change). The patch is
    /// expected to be validated already.
    pub async fn update_user_settings(
        &self,
        user_id: i64,
        patch: &SettingsPatch,
    ) -> DbResult<UserSettings> {
        let mut settings = self.get_user_settings(user_id).await?;
        patch.apply_to(&mut settings);

        sqlx::query(
            r#"
            UPDATE user_settings
            SET focus_minutes = ?, short_break_minutes = ?, long_break_minutes = ?,
                cycles_before_long_break = ?, daily_goal_minutes = ?,
                auto_start_breaks = ?, auto_start_focus = ?, sound_enabled = ?,
                timer_strategy = ?
            WHERE user_id = ?
            "#,
        )
        .bind(settings.focus_minutes)
        .bind(settings.short_break_minutes)
        .bind(settings.long_break_minutes)
        .bind(settings.cycles_before_long_break)
        .bind(settings.daily_goal_minutes)
        .bind(settings.auto_start_breaks)
        .bind(settings.auto_start_focus)
        .bind(settings.sound_enabled)
        .bind(settings.timer_strategy.as_str())
        .bind(user_id)
        .execute(self.pool())
        .await?;

        Ok(settings)
    }
}
