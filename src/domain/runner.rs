use super::enums::Mode;
use super::task::EpochMs;
use serde::{Deserialize, Serialize};

/// Grace period between a completed step and the auto-start of the next one
pub const AUTO_START_GRACE_MS: i64 = 15_000;

/// Latest-finish presets offered in the UI (minutes from midnight)
pub const LATEST_FINISH_PRESETS: [u32; 6] = [
    17 * 60 + 30,
    18 * 60,
    18 * 60 + 30,
    19 * 60,
    20 * 60,
    21 * 60,
];

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Runner state for the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerState {
    pub mode: Mode,
    pub active_task_id: Option<String>,
    pub active_started_at: Option<EpochMs>,
    /// Run mode is on but nothing is counting down
    pub awaiting_next_start: bool,
    /// Return to plan mode once the active task completes
    pub stop_after_this_task: bool,
    // Active-task pause: extends the deadline by the time spent paused
    pub paused_at: Option<EpochMs>,
    pub pause_accumulated_ms: i64,
    // Auto-start countdown between steps
    pub auto_start_at: Option<EpochMs>,
    pub auto_start_paused_at: Option<EpochMs>,
    pub auto_start_paused_remaining_ms: Option<i64>,
}

impl Default for RunnerState {
    fn default() -> Self {
        Self {
            mode: Mode::Plan,
            active_task_id: None,
            active_started_at: None,
            awaiting_next_start: false,
            stop_after_this_task: false,
            paused_at: None,
            pause_accumulated_ms: 0,
            auto_start_at: None,
            auto_start_paused_at: None,
            auto_start_paused_remaining_ms: None,
        }
    }
}

impl RunnerState {
    pub fn is_running(&self) -> bool {
        self.mode == Mode::Run
    }

    pub fn is_active_paused(&self) -> bool {
        self.active_task_id.is_some() && self.paused_at.is_some()
    }

    pub fn is_auto_start_paused(&self) -> bool {
        self.auto_start_at.is_some() && self.auto_start_paused_at.is_some()
    }

    /// Drop the active task and its pause bookkeeping
    pub fn clear_active(&mut self) {
        self.active_task_id = None;
        self.active_started_at = None;
        self.paused_at = None;
        self.pause_accumulated_ms = 0;
    }

    /// Cancel any pending auto-start
    pub fn clear_auto_start(&mut self) {
        self.auto_start_at = None;
        self.auto_start_paused_at = None;
        self.auto_start_paused_remaining_ms = None;
    }
}

/// User settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Cutoff as minutes from local midnight (e.g. 18:00 => 1080)
    pub latest_finish_minutes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            latest_finish_minutes: 18 * 60,
        }
    }
}

impl Settings {
    /// Set the cutoff, clamped to a valid time of day
    pub fn set_latest_finish(&mut self, minutes: u32) {
        self.latest_finish_minutes = minutes.min(MINUTES_PER_DAY - 1);
    }

    /// Step to the next preset after the current cutoff, wrapping around
    pub fn cycle_latest_finish(&mut self) {
        let next = LATEST_FINISH_PRESETS
            .iter()
            .copied()
            .find(|&m| m > self.latest_finish_minutes)
            .unwrap_or(LATEST_FINISH_PRESETS[0]);
        self.latest_finish_minutes = next;
    }
}
