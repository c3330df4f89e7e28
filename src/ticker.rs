use std::time::Duration;

/// Coarse tick: projections and auto-start evaluation
pub const COARSE_TICK_MS: u64 = 1000;

/// Fine tick: only redraws the visible countdown
pub const FINE_TICK_MS: u64 = 250;

/// How long the event loop waits for input before redrawing
pub fn poll_duration() -> Duration {
    Duration::from_millis(FINE_TICK_MS)
}

/// Tracks when the next coarse tick is due
#[derive(Debug, Clone, Default)]
pub struct CoarseTicker {
    last: Option<i64>,
}

impl CoarseTicker {
    /// True when at least a coarse interval has passed since the last tick
    pub fn due(&mut self, now_ms: i64) -> bool {
        match self.last {
            Some(last) if now_ms - last < COARSE_TICK_MS as i64 => false,
            _ => {
                self.last = Some(now_ms);
                true
            }
        }
    }
}
