pub mod clock;
pub mod format;
pub mod projector;
pub mod scheduler;

use crate::domain::{EpochMs, IdGenerator, RunnerState, Settings, Task, TaskStatus, TaskStore, UuidIds};
use tracing::info;

/// Something the host should react to after a session operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SprintEffect {
    /// A step was completed; show some praise
    Celebrate { title: String },
    /// The grace period elapsed and the next step started on its own
    AutoStarted { task_id: String },
    /// Nothing runnable remains in the sprint
    SprintComplete,
}

/// Tasks, runner and settings for one user session.
///
/// Every mutation goes through here so the task list and the runner
/// never disagree about which task is active.
pub struct SprintSession {
    store: TaskStore,
    pub runner: RunnerState,
    pub settings: Settings,
    ids: Box<dyn IdGenerator>,
}

impl SprintSession {
    pub fn new(store: TaskStore, runner: RunnerState, settings: Settings) -> Self {
        Self::with_ids(store, runner, settings, Box::new(UuidIds))
    }

    pub fn with_ids(
        store: TaskStore,
        runner: RunnerState,
        settings: Settings,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            runner,
            settings,
            ids,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    /// The task the runner is counting down, if any
    pub fn active_task(&self) -> Option<&Task> {
        self.runner
            .active_task_id
            .as_deref()
            .and_then(|id| self.store.get(id))
    }

    /// Parent of the active task, when the active task is a subtask
    pub fn active_parent(&self) -> Option<&Task> {
        let parent_id = self.active_task()?.parent_id.as_deref()?;
        self.store.get(parent_id)
    }

    /// Release the runner when its active task was completed or removed
    /// behind its back.
    fn reconcile_active(&mut self) {
        let Some(active_id) = self.runner.active_task_id.as_deref() else {
            return;
        };
        let still_active = self
            .store
            .get(active_id)
            .is_some_and(|t| t.status == TaskStatus::Active);
        if !still_active {
            info!(task_id = active_id, "active task gone; waiting for next start");
            self.runner.clear_active();
            self.runner.awaiting_next_start = true;
        }
    }

    pub fn add_task(&mut self, title: String, minutes: f64, now: EpochMs) -> String {
        self.store.add_task(self.ids.as_mut(), title, minutes, now)
    }

    /// Adding the first child to the running task turns it into a
    /// container, so the runner lets go of it.
    pub fn add_subtask(&mut self, parent_id: &str, title: String, minutes: f64, now: EpochMs) -> Option<String> {
        let id = self
            .store
            .add_subtask(self.ids.as_mut(), parent_id, title, minutes, now);
        self.reconcile_active();
        id
    }

    pub fn duplicate_task(&mut self, id: &str, now: EpochMs) -> Option<String> {
        self.store.duplicate_task(self.ids.as_mut(), id, now)
    }

    pub fn insert_break_next(&mut self, minutes: u32, now: EpochMs) -> String {
        self.store.insert_break_next(self.ids.as_mut(), minutes, now)
    }

    pub fn insert_break_in_plan(&mut self, minutes: u32, now: EpochMs) -> String {
        self.store.insert_break_in_plan(self.ids.as_mut(), minutes, now)
    }

    pub fn edit_title(&mut self, id: &str, title: String) -> bool {
        self.store.edit_title(id, title)
    }

    pub fn edit_minutes(&mut self, id: &str, minutes: f64) -> bool {
        self.store.edit_minutes(id, minutes)
    }

    pub fn toggle_in_sprint(&mut self, id: &str) -> bool {
        self.store.toggle_in_sprint(id)
    }

    pub fn toggle_done(&mut self, id: &str) -> Option<TaskStatus> {
        let status = self.store.toggle_done(id);
        self.reconcile_active();
        status
    }

    pub fn delete_task(&mut self, id: &str) -> Vec<String> {
        let removed = self.store.delete_task(id);
        self.reconcile_active();
        removed
    }

    pub fn reorder_sprint(&mut self, ordered_ids: &[String]) {
        self.store.reorder_sprint(ordered_ids);
    }

    pub fn reorder_subtasks(&mut self, parent_id: &str, ordered_child_ids: &[String]) -> bool {
        self.store.reorder_subtasks(parent_id, ordered_child_ids)
    }

    pub fn set_latest_finish(&mut self, minutes: u32) {
        self.settings.set_latest_finish(minutes);
    }

    pub fn cycle_latest_finish(&mut self) {
        self.settings.cycle_latest_finish();
    }
}
