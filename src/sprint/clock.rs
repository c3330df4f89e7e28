use super::SprintSession;
use crate::domain::{EpochMs, RunnerState, TaskStore};
use tracing::debug;

/// Live countdown for the active task.
///
/// Pausing pushes the deadline back by the paused duration, so the value is
/// frozen while paused and picks up unchanged on resume.
pub fn active_remaining_ms(now: EpochMs, runner: &RunnerState, store: &TaskStore) -> i64 {
    let (Some(id), Some(started_at)) = (runner.active_task_id.as_deref(), runner.active_started_at) else {
        return 0;
    };
    let Some(task) = store.get(id) else {
        return 0;
    };

    let paused_so_far = runner.pause_accumulated_ms + runner.paused_at.map_or(0, |at| (now - at).max(0));
    let end_at = started_at + task.total_ms() + paused_so_far;
    (end_at - now).max(0)
}

/// Planned end of the active task from its start, ignoring pauses
pub fn active_ends_at(runner: &RunnerState, store: &TaskStore) -> Option<EpochMs> {
    let task = store.get(runner.active_task_id.as_deref()?)?;
    Some(runner.active_started_at? + task.total_ms())
}

/// Time left before the next step auto-starts; frozen while paused
pub fn auto_start_remaining_ms(now: EpochMs, runner: &RunnerState) -> Option<i64> {
    let at = runner.auto_start_at?;
    if runner.auto_start_paused_at.is_some() {
        if let Some(remaining) = runner.auto_start_paused_remaining_ms {
            return Some(remaining);
        }
    }
    Some((at - now).max(0))
}

/// The active task has run out its time
pub fn is_time_up(now: EpochMs, runner: &RunnerState, store: &TaskStore) -> bool {
    let has_active = runner
        .active_task_id
        .as_deref()
        .is_some_and(|id| store.get(id).is_some());
    has_active && runner.active_started_at.is_some() && active_remaining_ms(now, runner, store) == 0
}

impl SprintSession {
    pub fn active_remaining_ms(&self, now: EpochMs) -> i64 {
        active_remaining_ms(now, &self.runner, &self.store)
    }

    /// Pause or resume whichever countdown is running: the active task's,
    /// or the auto-start grace period. Returns false when neither applies.
    pub fn toggle_pause(&mut self, now: EpochMs) -> bool {
        let runner = &mut self.runner;

        if runner.active_task_id.is_some() {
            match runner.paused_at.take() {
                Some(paused_at) => {
                    runner.pause_accumulated_ms += (now - paused_at).max(0);
                    debug!(accumulated_ms = runner.pause_accumulated_ms, "active task resumed");
                }
                None => {
                    runner.paused_at = Some(now);
                    debug!("active task paused");
                }
            }
            return true;
        }

        let Some(auto_start_at) = runner.auto_start_at else {
            return false;
        };
        if runner.auto_start_paused_at.is_some() {
            let remaining = runner.auto_start_paused_remaining_ms.unwrap_or(0);
            runner.auto_start_at = Some(now + remaining);
            runner.auto_start_paused_at = None;
            runner.auto_start_paused_remaining_ms = None;
            debug!(remaining_ms = remaining, "auto-start resumed");
        } else {
            runner.auto_start_paused_remaining_ms = Some((auto_start_at - now).max(0));
            runner.auto_start_paused_at = Some(now);
            debug!("auto-start paused");
        }
        true
    }

    /// Grant the active task more time
    pub fn extend_active(&mut self, minutes: u32) -> bool {
        let Some(id) = self.runner.active_task_id.clone() else {
            return false;
        };
        self.store.add_extra_minutes(&id, minutes)
    }

    /// Take time away from the active task (extra first, estimate never below 1)
    pub fn reduce_active(&mut self, minutes: u32) -> bool {
        let Some(id) = self.runner.active_task_id.clone() else {
            return false;
        };
        self.store.reduce_minutes(&id, minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::domain::MS_PER_MINUTE;

    const MIN: i64 = MS_PER_MINUTE;

    #[test]
    fn test_remaining_without_active_is_zero() {
        let session = session(vec![leaf("a", 25.0)]);
        assert_eq!(session.active_remaining_ms(0), 0);
    }

    #[test]
    fn test_remaining_counts_down() {
        let mut session = session(vec![leaf("a", 25.0)]);
        session.start_sprint(0);
        assert_eq!(session.active_remaining_ms(0), 25 * MIN);
        assert_eq!(session.active_remaining_ms(10 * MIN), 15 * MIN);
        assert_eq!(session.active_remaining_ms(40 * MIN), 0);
    }

    #[test]
    fn test_pause_scenario_write_report() {
        let mut session = session(vec![leaf("Write report", 25.0)]);
        let t0 = 1_700_000_000_000;
        session.start_sprint(t0);

        assert!(session.toggle_pause(t0 + 2 * MIN));
        let frozen = session.active_remaining_ms(t0 + 2 * MIN);
        assert_eq!(frozen, 23 * MIN);
        assert_eq!(session.active_remaining_ms(t0 + 5 * MIN), frozen);

        assert!(session.toggle_pause(t0 + 7 * MIN));
        assert_eq!(session.runner.pause_accumulated_ms, 5 * MIN);
        assert_eq!(session.active_remaining_ms(t0 + 7 * MIN), frozen);
        assert_eq!(session.active_remaining_ms(t0 + 29 * MIN), MIN);
        assert_eq!(session.active_remaining_ms(t0 + 30 * MIN), 0);
        assert!(is_time_up(t0 + 30 * MIN, &session.runner, session.store()));
    }

    #[test]
    fn test_pause_auto_start_grace() {
        let mut session = session(vec![leaf("a", 5.0), leaf("b", 5.0)]);
        session.start_sprint(0);
        session.done_active(1_000);
        assert_eq!(auto_start_remaining_ms(6_000, &session.runner), Some(10_000));

        assert!(session.toggle_pause(6_000));
        assert_eq!(auto_start_remaining_ms(50_000, &session.runner), Some(10_000));

        assert!(session.toggle_pause(50_000));
        assert_eq!(session.runner.auto_start_at, Some(60_000));
        assert!(session.runner.auto_start_paused_at.is_none());
        assert_eq!(auto_start_remaining_ms(55_000, &session.runner), Some(5_000));
    }

    #[test]
    fn test_toggle_pause_noop_when_idle() {
        let mut session = session(vec![leaf("a", 5.0)]);
        assert!(!session.toggle_pause(0));
        assert!(auto_start_remaining_ms(0, &session.runner).is_none());
    }

    #[test]
    fn test_extend_and_reduce_active() {
        let mut session = session(vec![leaf("a", 25.0)]);
        assert!(!session.extend_active(5));

        session.start_sprint(0);
        assert!(session.extend_active(10));
        assert_eq!(session.active_remaining_ms(0), 35 * MIN);

        assert!(session.reduce_active(5));
        let task = session.store().get("a").unwrap();
        assert_eq!(task.extra_minutes, 5);
        assert_eq!(task.estimate_minutes, 25);

        session.reduce_active(100);
        let task = session.store().get("a").unwrap();
        assert_eq!(task.extra_minutes, 0);
        assert_eq!(task.estimate_minutes, 1);
    }

    #[test]
    fn test_active_ends_at_ignores_pause() {
        let mut session = session(vec![leaf("a", 25.0)]);
        assert!(active_ends_at(&session.runner, session.store()).is_none());
        session.start_sprint(1_000);
        session.toggle_pause(2_000);
        assert_eq!(active_ends_at(&session.runner, session.store()), Some(1_000 + 25 * MIN));
        assert!(!is_time_up(2_000, &session.runner, session.store()));
    }
}
