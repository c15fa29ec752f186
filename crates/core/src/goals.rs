// crates/core/src/goals.rs
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// How far along a goal is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    /// 0.0 to 100.0, one decimal. Exactly 100.0 only when completed.
    pub percent: f64,
    pub completed: bool,
}

pub fn goal_progress(target_value: i64, current_value: i64) -> GoalProgress {
    if target_value <= 0 {
        return GoalProgress {
            percent: 100.0,
            completed: true,
        };
    }
    let completed = current_value >= target_value;
    let raw = (current_value.max(0) as f64 / target_value as f64) * 100.0;
    // 100.0 is reserved for completed goals; rounding must not reach it early.
    let percent = if completed {
        100.0
    } else {
        ((raw * 10.0).round() / 10.0).min(99.9)
    };
    GoalProgress { percent, completed }
}
