// crates/core/src/timer.rs
//! Pomodoro timer reducer.
//!
//! The client drives this with one `Tick` per second while the timer runs and
//! forwards the returned effects to the session API (`SessionStarted` opens a
//! focus-session row, `SessionCompleted` / `SessionAbandoned` close it).
//!
//! ```text
//!            Start              Tick (remaining == 0)
//!   Idle ─────────────▶ Running ─────────────────────▶ Finished
//!    ▲                  │    ▲                           │
//!    │ Reset / Skip     │    │ Resume                    │ Start (advances mode)
//!    └──────────────────┤    │                           │
//!                 Pause ▼    │                           ▼
//!                       Paused                         Running
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{SessionType, UserSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Durations and toggles the reducer needs, derived from user settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct TimerConfig {
    pub focus_secs: u32,
    pub short_break_secs: u32,
    pub long_break_secs: u32,
    pub cycles_before_long_break: u32,
    pub auto_start_breaks: bool,
    pub auto_start_focus: bool,
}

impl TimerConfig {
    pub fn duration_of(&self, mode: SessionType) -> u32 {
        match mode {
            SessionType::Focus => self.focus_secs,
            SessionType::ShortBreak => self.short_break_secs,
            SessionType::LongBreak => self.long_break_secs,
        }
    }

    fn auto_starts(&self, mode: SessionType) -> bool {
        if mode.is_break() {
            self.auto_start_breaks
        } else {
            self.auto_start_focus
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::from(&UserSettings::default())
    }
}

impl From<&UserSettings> for TimerConfig {
    fn from(s: &UserSettings) -> Self {
        let secs = |minutes: i64| (minutes.max(1) as u32).saturating_mul(60);
        Self {
            focus_secs: secs(s.focus_minutes),
            short_break_secs: secs(s.short_break_minutes),
            long_break_secs: secs(s.long_break_minutes),
            cycles_before_long_break: s.cycles_before_long_break.max(1) as u32,
            auto_start_breaks: s.auto_start_breaks,
            auto_start_focus: s.auto_start_focus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Start,
    Pause,
    Resume,
    Tick,
    Reset,
    Skip,
}

/// Side effects the owner of the timer must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerEffect {
    SessionStarted { mode: SessionType },
    SessionCompleted { mode: SessionType },
    SessionAbandoned { mode: SessionType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub mode: SessionType,
    pub remaining_secs: u32,
    /// Focus blocks run to completion since the timer was created.
    pub completed_focus: u32,
}

impl TimerState {
    pub fn new(config: &TimerConfig) -> Self {
        Self {
            status: TimerStatus::Idle,
            mode: SessionType::Focus,
            remaining_secs: config.focus_secs,
            completed_focus: 0,
        }
    }

    /// The mode that follows the current one.
    pub fn next_mode(&self, config: &TimerConfig) -> SessionType {
        match self.mode {
            SessionType::Focus => {
                let cycles = config.cycles_before_long_break.max(1);
                if self.completed_focus > 0 && self.completed_focus % cycles == 0 {
                    SessionType::LongBreak
                } else {
                    SessionType::ShortBreak
                }
            }
            SessionType::ShortBreak | SessionType::LongBreak => SessionType::Focus,
        }
    }

    fn in_progress(&self) -> bool {
        matches!(self.status, TimerStatus::Running | TimerStatus::Paused)
    }

    fn advance(&mut self, config: &TimerConfig) {
        self.mode = self.next_mode(config);
        self.remaining_secs = config.duration_of(self.mode);
        self.status = TimerStatus::Idle;
    }

    fn begin(&mut self, effects: &mut Vec<TimerEffect>) {
        self.status = TimerStatus::Running;
        effects.push(TimerEffect::SessionStarted { mode: self.mode });
    }

    /// Advance to the next mode, starting it right away if the matching
    /// auto-start toggle is on.
    fn advance_and_maybe_start(&mut self, config: &TimerConfig, effects: &mut Vec<TimerEffect>) {
        self.advance(config);
        if config.auto_starts(self.mode) {
            self.begin(effects);
        }
    }

    /// Apply one event. Events that make no sense in the current state are
    /// ignored and produce no effects.
    pub fn apply(&mut self, event: TimerEvent, config: &TimerConfig) -> Vec<TimerEffect> {
        let mut effects = Vec::new();
        match (event, self.status) {
            (TimerEvent::Start, TimerStatus::Idle) => self.begin(&mut effects),
            (TimerEvent::Start, TimerStatus::Finished) => {
                self.advance(config);
                self.begin(&mut effects);
            }
            (TimerEvent::Pause, TimerStatus::Running) => self.status = TimerStatus::Paused,
            (TimerEvent::Resume, TimerStatus::Paused) => self.status = TimerStatus::Running,
            (TimerEvent::Tick, TimerStatus::Running) => {
                self.remaining_secs = self.remaining_secs.saturating_sub(1);
                if self.remaining_secs == 0 {
                    self.status = TimerStatus::Finished;
                    if self.mode == SessionType::Focus {
                        self.completed_focus += 1;
                    }
                    effects.push(TimerEffect::SessionCompleted { mode: self.mode });
                    if config.auto_starts(self.next_mode(config)) {
                        self.advance_and_maybe_start(config, &mut effects);
                    }
                }
            }
            (TimerEvent::Reset, _) => {
                if self.in_progress() {
                    effects.push(TimerEffect::SessionAbandoned { mode: self.mode });
                }
                self.status = TimerStatus::Idle;
                self.remaining_secs = config.duration_of(self.mode);
            }
            (TimerEvent::Skip, _) => {
                if self.in_progress() {
                    effects.push(TimerEffect::SessionAbandoned { mode: self.mode });
                }
                self.advance_and_maybe_start(config, &mut effects);
            }
            _ => {}
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn short_config() -> TimerConfig {
        TimerConfig {
            focus_secs: 3,
            short_break_secs: 2,
            long_break_secs: 4,
            cycles_before_long_break: 2,
            auto_start_breaks: false,
            auto_start_focus: false,
        }
    }

    fn run_to_end(state: &mut TimerState, config: &TimerConfig) -> Vec<TimerEffect> {
        let mut all = Vec::new();
        while state.status == TimerStatus::Running {
            all.extend(state.apply(TimerEvent::Tick, config));
        }
        all
    }

    #[test]
    fn test_default_config_from_settings() {
        let config = TimerConfig::default();
        assert_eq!(config.focus_secs, 25 * 60);
        assert_eq!(config.short_break_secs, 5 * 60);
        assert_eq!(config.long_break_secs, 15 * 60);
        assert_eq!(config.cycles_before_long_break, 4);
    }

    #[test]
    fn test_start_tick_finish() {
        let config = short_config();
        let mut state = TimerState::new(&config);
        assert_eq!(
            state.apply(TimerEvent::Start, &config),
            vec![TimerEffect::SessionStarted { mode: SessionType::Focus }]
        );
        let effects = run_to_end(&mut state, &config);
        assert_eq!(effects, vec![TimerEffect::SessionCompleted { mode: SessionType::Focus }]);
        assert_eq!(state.status, TimerStatus::Finished);
        assert_eq!(state.completed_focus, 1);
    }

    #[test]
    fn test_pause_stops_countdown() {
        let config = short_config();
        let mut state = TimerState::new(&config);
        state.apply(TimerEvent::Start, &config);
        state.apply(TimerEvent::Tick, &config);
        state.apply(TimerEvent::Pause, &config);
        state.apply(TimerEvent::Tick, &config);
        assert_eq!(state.remaining_secs, 2);
        assert_eq!(state.status, TimerStatus::Paused);
        state.apply(TimerEvent::Resume, &config);
        state.apply(TimerEvent::Tick, &config);
        assert_eq!(state.remaining_secs, 1);
    }

    #[test]
    fn test_long_break_after_cycles() {
        let config = short_config();
        let mut state = TimerState::new(&config);
        let mut modes = Vec::new();
        for _ in 0..4 {
            state.apply(TimerEvent::Start, &config);
            modes.push(state.mode);
            run_to_end(&mut state, &config);
        }
        assert_eq!(
            modes,
            vec![
                SessionType::Focus,
                SessionType::ShortBreak,
                SessionType::Focus,
                SessionType::LongBreak,
            ]
        );
    }

    #[test]
    fn test_reset_abandons_running_block() {
        let config = short_config();
        let mut state = TimerState::new(&config);
        state.apply(TimerEvent::Start, &config);
        state.apply(TimerEvent::Tick, &config);
        let effects = state.apply(TimerEvent::Reset, &config);
        assert_eq!(effects, vec![TimerEffect::SessionAbandoned { mode: SessionType::Focus }]);
        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.remaining_secs, 3);
        assert_eq!(state.completed_focus, 0);
    }

    #[test]
    fn test_reset_when_idle_is_silent() {
        let config = short_config();
        let mut state = TimerState::new(&config);
        assert!(state.apply(TimerEvent::Reset, &config).is_empty());
    }

    #[test]
    fn test_skip_moves_to_break_without_counting_focus() {
        let config = short_config();
        let mut state = TimerState::new(&config);
        state.apply(TimerEvent::Start, &config);
        let effects = state.apply(TimerEvent::Skip, &config);
        assert_eq!(effects, vec![TimerEffect::SessionAbandoned { mode: SessionType::Focus }]);
        assert_eq!(state.mode, SessionType::ShortBreak);
        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.completed_focus, 0);
    }

    #[test]
    fn test_auto_start_break_after_focus() {
        let config = TimerConfig {
            auto_start_breaks: true,
            ..short_config()
        };
        let mut state = TimerState::new(&config);
        state.apply(TimerEvent::Start, &config);
        state.apply(TimerEvent::Tick, &config);
        state.apply(TimerEvent::Tick, &config);
        let effects = state.apply(TimerEvent::Tick, &config);
        assert_eq!(
            effects,
            vec![
                TimerEffect::SessionCompleted { mode: SessionType::Focus },
                TimerEffect::SessionStarted { mode: SessionType::ShortBreak },
            ]
        );
        assert_eq!(state.status, TimerStatus::Running);
        assert_eq!(state.remaining_secs, 2);
    }

    #[test]
    fn test_ignored_events() {
        let config = short_config();
        let mut state = TimerState::new(&config);
        assert!(state.apply(TimerEvent::Tick, &config).is_empty());
        assert!(state.apply(TimerEvent::Pause, &config).is_empty());
        assert!(state.apply(TimerEvent::Resume, &config).is_empty());
        assert_eq!(state, TimerState::new(&config));
    }

    #[test]
    fn test_effect_serialization() {
        let json = serde_json::to_string(&TimerEffect::SessionStarted {
            mode: SessionType::LongBreak,
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"session_started","mode":"long_break"}"#);
    }
}
