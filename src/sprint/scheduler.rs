use super::{SprintEffect, SprintSession};
use crate::domain::{EpochMs, Mode, RunnerState, TaskStatus, TaskStore, AUTO_START_GRACE_MS};
use tracing::{debug, info};

/// What the host must do after a tick has been evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    None,
    /// The grace period elapsed; start this step
    StartNext(String),
    /// The grace period elapsed but nothing is left to run
    Exhausted,
}

/// The next runnable step in the sprint, or `None` when the sprint is done.
///
/// Breaks and leaf tasks run themselves; a parent contributes its first
/// queued child and is never run directly.
pub fn next_step_id(store: &TaskStore) -> Option<String> {
    for task in store.sprint_top_level() {
        if task.is_break() || !store.has_children(&task.id) {
            if task.status == TaskStatus::Queued {
                return Some(task.id.clone());
            }
            continue;
        }

        if let Some(kid) = store
            .children(&task.id)
            .find(|k| k.status == TaskStatus::Queued)
        {
            return Some(kid.id.clone());
        }
    }
    None
}

/// Pure auto-start policy, evaluated once per coarse tick
pub fn evaluate(now: EpochMs, runner: &RunnerState, store: &TaskStore) -> (RunnerState, TickAction) {
    let mut next = runner.clone();

    let due = runner.is_running()
        && runner.auto_start_paused_at.is_none()
        && runner.auto_start_at.is_some_and(|at| now >= at);
    if !due {
        return (next, TickAction::None);
    }

    match next_step_id(store) {
        Some(id) => (next, TickAction::StartNext(id)),
        None => {
            next.clear_auto_start();
            next.awaiting_next_start = true;
            (next, TickAction::Exhausted)
        }
    }
}

impl SprintSession {
    pub fn next_step_id(&self) -> Option<String> {
        next_step_id(&self.store)
    }

    /// Mark `id` as the one active task
    fn activate(&mut self, id: &str) {
        self.store.demote_active();
        self.store.set_status(id, TaskStatus::Active);
    }

    /// Begin a fresh run from plan mode. No-op when nothing is runnable.
    pub fn start_sprint(&mut self, now: EpochMs) -> bool {
        let Some(id) = self.next_step_id() else {
            debug!("start sprint ignored: no runnable step");
            return false;
        };
        self.activate(&id);
        self.runner = RunnerState {
            mode: Mode::Run,
            active_task_id: Some(id.clone()),
            active_started_at: Some(now),
            ..RunnerState::default()
        };
        info!(task_id = %id, "sprint started");
        true
    }

    /// Start the next step, keeping session flags such as stop-after-this
    pub fn start_next(&mut self, now: EpochMs) -> bool {
        let Some(id) = self.next_step_id() else {
            debug!("start next ignored: no runnable step");
            return false;
        };
        self.begin_step(id, now);
        true
    }

    fn begin_step(&mut self, id: String, now: EpochMs) {
        self.activate(&id);
        self.runner.mode = Mode::Run;
        self.runner.clear_active();
        self.runner.clear_auto_start();
        self.runner.active_task_id = Some(id.clone());
        self.runner.active_started_at = Some(now);
        self.runner.awaiting_next_start = false;
        info!(task_id = %id, "step started");
    }

    /// Complete the active task and move on: back to plan if a stop was
    /// requested, otherwise into the auto-start grace period.
    pub fn done_active(&mut self, now: EpochMs) -> Vec<SprintEffect> {
        let Some(id) = self.runner.active_task_id.clone() else {
            return Vec::new();
        };
        let Some(title) = self.store.get(&id).map(|t| t.title.clone()) else {
            self.reconcile_active();
            return Vec::new();
        };

        self.store.set_status(&id, TaskStatus::Done);
        let mut effects = vec![SprintEffect::Celebrate { title }];

        if self.runner.stop_after_this_task {
            self.runner = RunnerState::default();
            info!(task_id = %id, "task done; stopping as requested");
            return effects;
        }

        self.runner.clear_active();
        self.runner.clear_auto_start();
        self.runner.awaiting_next_start = true;
        if self.next_step_id().is_some() {
            self.runner.auto_start_at = Some(now + AUTO_START_GRACE_MS);
            info!(task_id = %id, "task done; next step starts after grace period");
        } else {
            info!(task_id = %id, "task done; sprint complete");
            effects.push(SprintEffect::SprintComplete);
        }
        effects
    }

    /// Delete the active task (and its children, for a parent)
    pub fn delete_active(&mut self) -> Vec<String> {
        let Some(id) = self.runner.active_task_id.clone() else {
            return Vec::new();
        };
        info!(task_id = %id, "deleting active task");
        self.delete_task(&id)
    }

    /// Return to plan mode after the current task completes
    pub fn stop_after_this_task(&mut self) {
        self.runner.stop_after_this_task = true;
    }

    /// Leave run mode, putting any active task back in the queue
    pub fn exit_to_plan(&mut self) {
        self.store.demote_active();
        self.runner = RunnerState::default();
        info!("back to plan");
    }

    /// Run mode with nothing active and nothing left to start
    pub fn sprint_is_complete(&self) -> bool {
        self.runner.is_running()
            && self.runner.active_task_id.is_none()
            && self.next_step_id().is_none()
    }

    /// Apply one coarse clock tick
    pub fn tick(&mut self, now: EpochMs) -> Vec<SprintEffect> {
        self.reconcile_active();
        let (runner, action) = evaluate(now, &self.runner, &self.store);
        self.runner = runner;

        match action {
            TickAction::None => Vec::new(),
            TickAction::StartNext(id) => {
                self.begin_step(id.clone(), now);
                vec![SprintEffect::AutoStarted { task_id: id }]
            }
            TickAction::Exhausted => {
                info!("auto-start found nothing left to run");
                vec![SprintEffect::SprintComplete]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn count_active(session: &SprintSession) -> usize {
        session
            .tasks()
            .iter()
            .filter(|t| t.status == TaskStatus::Active)
            .count()
    }

    #[test]
    fn test_next_step_skips_parents_and_done() {
        let mut done = leaf("done", 5.0);
        done.status = TaskStatus::Done;
        let mut later = leaf("later", 5.0);
        later.in_sprint = false;
        let mut k1 = child("k1", "p", 5.0);
        k1.status = TaskStatus::Done;

        let store = TaskStore::new(vec![
            later,
            leaf("p", 999.0),
            k1,
            child("k2", "p", 5.0),
            leaf("q", 5.0),
            done,
        ]);
        assert_eq!(next_step_id(&store).as_deref(), Some("k2"));
    }

    #[test]
    fn test_next_step_skips_parent_with_no_queued_children() {
        let mut k1 = child("k1", "p", 5.0);
        k1.status = TaskStatus::Active;
        let store = TaskStore::new(vec![leaf("p", 5.0), k1, brk("b", 5)]);
        assert_eq!(next_step_id(&store).as_deref(), Some("b"));
    }

    #[test]
    fn test_next_step_none_when_exhausted() {
        let mut done = leaf("a", 5.0);
        done.status = TaskStatus::Done;
        assert_eq!(next_step_id(&TaskStore::new(vec![done])), None);
        assert_eq!(next_step_id(&TaskStore::default()), None);
    }

    #[test]
    fn test_start_sprint_requires_a_step() {
        let mut session = session(vec![]);
        assert!(!session.start_sprint(0));
        assert_eq!(session.runner.mode, Mode::Plan);
    }

    #[test]
    fn test_start_sprint_initializes_runner() {
        let mut session = session(vec![leaf("a", 25.0), leaf("b", 10.0)]);
        session.runner.stop_after_this_task = true;
        session.runner.pause_accumulated_ms = 42;

        assert!(session.start_sprint(1_000));
        assert_eq!(session.runner.mode, Mode::Run);
        assert_eq!(session.runner.active_task_id.as_deref(), Some("a"));
        assert_eq!(session.runner.active_started_at, Some(1_000));
        assert_eq!(session.runner.pause_accumulated_ms, 0);
        assert!(!session.runner.stop_after_this_task);
        assert_eq!(session.store().get("a").unwrap().status, TaskStatus::Active);
    }

    #[test]
    fn test_done_active_schedules_auto_start() {
        let mut session = session(vec![leaf("a", 25.0), leaf("b", 10.0)]);
        session.start_sprint(0);

        let effects = session.done_active(60_000);
        assert_eq!(effects, vec![SprintEffect::Celebrate { title: "a".to_string() }]);
        assert_eq!(session.store().get("a").unwrap().status, TaskStatus::Done);
        assert_eq!(session.runner.mode, Mode::Run);
        assert!(session.runner.active_task_id.is_none());
        assert!(session.runner.awaiting_next_start);
        assert_eq!(session.runner.auto_start_at, Some(75_000));
    }

    #[test]
    fn test_done_active_without_active_is_noop() {
        let mut session = session(vec![leaf("a", 25.0)]);
        assert!(session.done_active(0).is_empty());
        assert_eq!(session.store().get("a").unwrap().status, TaskStatus::Queued);
    }

    #[test]
    fn test_done_active_honours_stop_request() {
        let mut session = session(vec![leaf("a", 25.0), leaf("b", 10.0)]);
        session.start_sprint(0);
        session.stop_after_this_task();

        session.done_active(1_000);
        assert_eq!(session.runner, RunnerState::default());
        assert_eq!(count_active(&session), 0);
    }

    #[test]
    fn test_done_last_step_completes_sprint() {
        let mut session = session(vec![leaf("a", 25.0)]);
        session.start_sprint(0);

        let effects = session.done_active(1_000);
        assert!(effects.contains(&SprintEffect::SprintComplete));
        assert!(session.runner.auto_start_at.is_none());
        assert!(session.sprint_is_complete());

        session.exit_to_plan();
        assert!(!session.sprint_is_complete());
        assert_eq!(session.runner.mode, Mode::Plan);
    }

    #[test]
    fn test_done_child_completes_parent() {
        let mut session = session(vec![leaf("p", 5.0), child("k1", "p", 10.0), leaf("q", 5.0)]);
        session.start_sprint(0);
        session.done_active(1_000);
        assert_eq!(session.store().get("p").unwrap().status, TaskStatus::Done);
        assert_eq!(session.next_step_id().as_deref(), Some("q"));
    }

    #[test]
    fn test_start_next_keeps_stop_flag() {
        let mut session = session(vec![leaf("a", 25.0), leaf("b", 10.0), leaf("c", 5.0)]);
        session.start_sprint(0);
        session.done_active(1_000);
        session.stop_after_this_task();

        assert!(session.start_next(2_000));
        assert_eq!(session.runner.active_task_id.as_deref(), Some("b"));
        assert!(session.runner.stop_after_this_task);
        assert!(session.runner.auto_start_at.is_none());
        assert!(!session.runner.awaiting_next_start);
    }

    #[test]
    fn test_tick_auto_starts_after_grace() {
        let mut session = session(vec![leaf("a", 25.0), leaf("b", 10.0)]);
        session.start_sprint(0);
        session.done_active(1_000);

        assert!(session.tick(15_999).is_empty());
        let effects = session.tick(16_000);
        assert_eq!(effects, vec![SprintEffect::AutoStarted { task_id: "b".to_string() }]);
        assert_eq!(session.runner.active_started_at, Some(16_000));
        assert_eq!(count_active(&session), 1);
    }

    #[test]
    fn test_tick_waits_while_auto_start_paused() {
        let mut session = session(vec![leaf("a", 25.0), leaf("b", 10.0)]);
        session.start_sprint(0);
        session.done_active(1_000);
        session.toggle_pause(2_000);

        assert!(session.tick(60_000).is_empty());
        assert!(session.runner.active_task_id.is_none());
    }

    #[test]
    fn test_evaluate_exhausted_clears_auto_start() {
        let runner = RunnerState {
            mode: Mode::Run,
            auto_start_at: Some(100),
            ..RunnerState::default()
        };
        let (next, action) = evaluate(100, &runner, &TaskStore::default());
        assert_eq!(action, TickAction::Exhausted);
        assert!(next.auto_start_at.is_none());
        assert!(next.awaiting_next_start);
    }

    #[test]
    fn test_evaluate_ignores_plan_mode() {
        let runner = RunnerState {
            auto_start_at: Some(100),
            ..RunnerState::default()
        };
        let (next, action) = evaluate(1_000, &runner, &TaskStore::default());
        assert_eq!(action, TickAction::None);
        assert_eq!(next, runner);
    }

    #[test]
    fn test_delete_active_cascades() {
        let mut session = session(vec![leaf("a", 25.0), leaf("p", 5.0), child("k1", "p", 5.0)]);
        session.start_sprint(0);
        session.done_active(1_000);
        session.start_next(2_000);
        assert_eq!(session.runner.active_task_id.as_deref(), Some("k1"));

        assert_eq!(session.delete_active(), vec!["k1"]);
        assert!(session.runner.active_task_id.is_none());
        assert!(session.runner.awaiting_next_start);
        assert!(session.store().get("k1").is_none());
    }

    #[test]
    fn test_delete_active_task_scenario() {
        let mut session = session(vec![leaf("p", 5.0), child("k1", "p", 5.0), child("k2", "p", 5.0)]);
        session.start_sprint(0);
        session.delete_task("k1");
        assert!(session.runner.active_task_id.is_none());
        assert!(session.runner.awaiting_next_start);
        assert_eq!(session.tasks().len(), 2);
    }

    #[test]
    fn test_at_most_one_active_through_a_run() {
        let mut session = session(vec![
            leaf("a", 5.0),
            brk("b", 5),
            leaf("p", 5.0),
            child("k1", "p", 5.0),
            child("k2", "p", 5.0),
        ]);
        let mut now = 0;
        session.start_sprint(now);
        while !session.sprint_is_complete() {
            assert!(count_active(&session) <= 1);
            now += 60_000;
            session.done_active(now);
            now += AUTO_START_GRACE_MS;
            session.tick(now);
            assert!(count_active(&session) <= 1);
        }
        assert!(session.tasks().iter().all(|t| t.status == TaskStatus::Done));
    }

    #[test]
    fn test_exit_to_plan_demotes_active() {
        let mut session = session(vec![leaf("a", 25.0)]);
        session.start_sprint(0);
        session.exit_to_plan();
        assert_eq!(session.store().get("a").unwrap().status, TaskStatus::Queued);
        assert_eq!(session.runner, RunnerState::default());
    }
}
