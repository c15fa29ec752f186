// crates/core/src/streak.rs
//! Focus streaks.
//!
//! A day qualifies when its cumulative focus time reaches
//! [`STREAK_MIN_MINUTES`]. The current streak is the run of consecutive
//! qualifying days ending today, or ending yesterday when today has not
//! qualified yet.

use chrono::NaiveDate;

/// Minutes of focus a day needs to count toward a streak.
pub const STREAK_MIN_MINUTES: i64 = 25;

/// Total focus minutes recorded on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyFocus {
    pub day: NaiveDate,
    pub minutes: i64,
}

impl DailyFocus {
    pub fn new(day: NaiveDate, minutes: i64) -> Self {
        Self { day, minutes }
    }

    pub fn qualifies(&self) -> bool {
        self.minutes >= STREAK_MIN_MINUTES
    }
}

/// Qualifying days not after `today`, most recent first, without duplicates.
fn qualifying_days_desc(days: &[DailyFocus], today: NaiveDate) -> Vec<NaiveDate> {
    let mut out: Vec<NaiveDate> = days
        .iter()
        .filter(|d| d.qualifies() && d.day <= today)
        .map(|d| d.day)
        .collect();
    out.sort_unstable_by(|a, b| b.cmp(a));
    out.dedup();
    out
}

/// Current streak length in days.
///
/// Rows may arrive in any order and may include non-qualifying days.
pub fn compute_streak(days: &[DailyFocus], today: NaiveDate) -> u32 {
    let qualifying = qualifying_days_desc(days, today);
    let Some(&most_recent) = qualifying.first() else {
        return 0;
    };

    // Anchored at today or yesterday, otherwise the chain is already broken.
    if most_recent != today && Some(most_recent) != today.pred_opt() {
        return 0;
    }

    let mut streak = 1;
    let mut prev = most_recent;
    for &day in &qualifying[1..] {
        if prev.pred_opt() != Some(day) {
            break;
        }
        streak += 1;
        prev = day;
    }
    streak
}

/// Longest run of consecutive qualifying days anywhere in `days`.
pub fn longest_streak(days: &[DailyFocus]) -> u32 {
    let mut qualifying: Vec<NaiveDate> = days.iter().filter(|d| d.qualifies()).map(|d| d.day).collect();
    qualifying.sort_unstable();
    qualifying.dedup();

    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for day in qualifying {
        run = match prev {
            Some(p) if p.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}
