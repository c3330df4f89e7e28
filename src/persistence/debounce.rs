use crate::domain::EpochMs;

/// Quiet interval before a requested save is written
pub const PERSIST_DEBOUNCE_MS: i64 = 500;

/// Collapses bursts of state changes into a single save.
///
/// Every request pushes the deadline back; the save becomes due once no
/// request has arrived for the quiet interval.
#[derive(Debug, Clone)]
pub struct PersistDebouncer {
    quiet_ms: i64,
    due_at: Option<EpochMs>,
}

impl Default for PersistDebouncer {
    fn default() -> Self {
        Self::new(PERSIST_DEBOUNCE_MS)
    }
}

impl PersistDebouncer {
    pub fn new(quiet_ms: i64) -> Self {
        Self {
            quiet_ms,
            due_at: None,
        }
    }

    pub fn request(&mut self, now: EpochMs) {
        self.due_at = Some(now + self.quiet_ms);
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.due_at.is_some()
    }

    /// True (once) when a pending save has gone quiet long enough
    pub fn take_due(&mut self, now: EpochMs) -> bool {
        match self.due_at {
            Some(due_at) if now >= due_at => {
                self.due_at = None;
                true
            }
            _ => false,
        }
    }

    /// Take any pending save regardless of timing (used on exit)
    pub fn flush(&mut self) -> bool {
        self.due_at.take().is_some()
    }
}
