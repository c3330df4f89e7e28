use crate::domain::{flatten_tasks, Bucket, EpochMs, FlatRow, Mode, RunnerState, Settings, Task, TaskStatus, TaskStore, UiMode};
use crate::notifications;
use crate::persistence::{PersistDebouncer, PersistedState, Storage};
use crate::sprint::clock::is_time_up;
use crate::sprint::format::{format_clock, format_countdown, format_minutes_of_day, format_total_minutes};
use crate::sprint::{SprintEffect, SprintSession};
use crate::error::StorageError;
use tracing::{info, warn};

/// Default estimate offered when adding a task
pub const DEFAULT_MINUTES: u32 = 25;
/// Step for +/- estimate adjustment in plan mode
pub const MINUTES_STEP: i64 = 5;

const TOAST_MS: i64 = 1400;
const SAVE_ERROR_TOAST_MS: i64 = 3000;

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> EpochMs {
    chrono::Local::now().timestamp_millis()
}

/// Transient notice shown in the footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub until: EpochMs,
}

/// Input form state for adding and editing tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFormState {
    pub title: String,
    pub minutes: String,
    pub editing_field: usize, // 0 = title, 1 = minutes
    /// Task being edited, or parent of the subtask being added
    pub target_id: Option<String>,
}

impl InputFormState {
    fn new(title: String, minutes: String, editing_field: usize, target_id: Option<String>) -> Self {
        Self {
            title,
            minutes,
            editing_field,
            target_id,
        }
    }

    /// Minutes typed into the form; unparseable input falls back to 1 on clamping
    fn parsed_minutes(&self) -> f64 {
        self.minutes.trim().parse::<f64>().unwrap_or(f64::NAN)
    }
}

/// Main application state
pub struct AppState {
    pub session: SprintSession,
    pub selected_index: usize,
    pub ui_mode: UiMode,
    pub input_form: Option<InputFormState>,
    pub toast: Option<Toast>,
    storage: Box<dyn Storage>,
    debouncer: PersistDebouncer,
    time_up_notified: Option<String>,
}

impl AppState {
    pub fn new(session: SprintSession, storage: Box<dyn Storage>) -> Self {
        Self {
            session,
            selected_index: 0,
            ui_mode: UiMode::Normal,
            input_form: None,
            toast: None,
            storage,
            debouncer: PersistDebouncer::default(),
            time_up_notified: None,
        }
    }

    /// Restore the last session from storage, or start empty
    pub fn load(storage: Box<dyn Storage>, latest_override: Option<u32>) -> Self {
        let (store, runner, mut settings) = match storage.load() {
            Some(state) => {
                info!(tasks = state.tasks.len(), mode = ?state.runner.mode, "restored previous session");
                (TaskStore::new(state.tasks), state.runner, state.settings)
            }
            None => (TaskStore::default(), RunnerState::default(), Settings::default()),
        };
        if let Some(minutes) = latest_override {
            settings.set_latest_finish(minutes);
        }
        Self::new(SprintSession::new(store, runner, settings), storage)
    }

    pub fn snapshot(&self) -> PersistedState {
        PersistedState::new(
            self.session.tasks().to_vec(),
            self.session.runner.clone(),
            self.session.settings.clone(),
        )
    }

    pub fn is_running(&self) -> bool {
        self.session.runner.mode == Mode::Run
    }

    // ---- persistence ----

    fn mark_dirty(&mut self, now: EpochMs) {
        self.debouncer.request(now);
    }

    /// Write the state once the debounce interval has passed.
    /// A failure keeps the in-memory state and schedules a retry.
    pub fn persist_if_due(&mut self, now: EpochMs) {
        if !self.debouncer.take_due(now) {
            return;
        }
        if let Err(e) = self.storage.save(&self.snapshot()) {
            warn!(error = %e, "saving state failed; will retry");
            self.show_toast("Couldn't save. Your changes are kept for now.", SAVE_ERROR_TOAST_MS, now);
            self.debouncer.request(now);
        }
    }

    /// Save any pending change immediately (used on exit)
    pub fn flush(&mut self) -> Result<(), StorageError> {
        if self.debouncer.flush() {
            self.storage.save(&self.snapshot())?;
        }
        Ok(())
    }

    // ---- toast ----

    fn show_toast(&mut self, message: impl Into<String>, duration_ms: i64, now: EpochMs) {
        self.toast = Some(Toast {
            message: message.into(),
            until: now + duration_ms,
        });
    }

    pub fn toast_message(&self, now: EpochMs) -> Option<&str> {
        self.toast
            .as_ref()
            .filter(|t| now < t.until)
            .map(|t| t.message.as_str())
    }

    // ---- clock ----

    /// Coarse tick: auto-start, time-up notification, housekeeping
    pub fn tick(&mut self, now: EpochMs) {
        let effects = self.session.tick(now);
        self.apply_effects(effects, now);

        if is_time_up(now, &self.session.runner, self.session.store()) {
            let active = self.session.active_task().map(|t| (t.id.clone(), t.title.clone()));
            if let Some((id, title)) = active {
                if self.time_up_notified.as_deref() != Some(id.as_str()) {
                    notifications::notify_time_up(&title);
                    self.time_up_notified = Some(id);
                }
            }
        }

        if self.toast.as_ref().is_some_and(|t| now >= t.until) {
            self.toast = None;
        }
        self.persist_if_due(now);
    }

    fn apply_effects(&mut self, effects: Vec<SprintEffect>, now: EpochMs) {
        for effect in effects {
            match effect {
                SprintEffect::Celebrate { title } => self.celebrate(&title, now),
                SprintEffect::AutoStarted { task_id } => {
                    if let Some(task) = self.session.store().get(&task_id) {
                        notifications::notify_auto_started(&task.title);
                    }
                    self.mark_dirty(now);
                }
                SprintEffect::SprintComplete => self.mark_dirty(now),
            }
        }
    }

    fn celebrate(&mut self, title: &str, now: EpochMs) {
        let praise = notifications::praise_for(&mut rand::thread_rng());
        notifications::celebrate(title, praise);
        self.show_toast(format!("Marked done. {}", praise), TOAST_MS, now);
    }

    // ---- selection ----

    pub fn rows(&self) -> Vec<FlatRow> {
        flatten_tasks(self.session.tasks())
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.session.tasks().get(self.selected_index)
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_task().map(|t| t.id.clone())
    }

    pub fn move_selection_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.session.tasks().len() {
            self.selected_index += 1;
        }
    }

    /// Keep the cursor on `id` after the list was re-normalized
    fn select_id(&mut self, id: &str) {
        if let Some(idx) = self.session.tasks().iter().position(|t| t.id == id) {
            self.selected_index = idx;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.session.tasks().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    /// Move the selected sprint task (or subtask) one slot up
    pub fn move_item_up(&mut self, now: EpochMs) {
        self.move_item(-1, now);
    }

    pub fn move_item_down(&mut self, now: EpochMs) {
        self.move_item(1, now);
    }

    fn move_item(&mut self, offset: isize, now: EpochMs) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };

        let mut siblings: Vec<String> = match task.parent_id.as_deref() {
            Some(parent_id) => self.session.store().children(parent_id).map(|t| t.id.clone()).collect(),
            None if Bucket::of(&task) == Bucket::Sprint => self
                .session
                .store()
                .top_level()
                .filter(|t| Bucket::of(t) == Bucket::Sprint)
                .map(|t| t.id.clone())
                .collect(),
            None => return,
        };

        let Some(pos) = siblings.iter().position(|id| *id == task.id) else {
            return;
        };
        let Some(target) = pos.checked_add_signed(offset).filter(|t| *t < siblings.len()) else {
            return;
        };
        siblings.swap(pos, target);

        match task.parent_id.as_deref() {
            Some(parent_id) => {
                self.session.reorder_subtasks(parent_id, &siblings);
            }
            None => self.session.reorder_sprint(&siblings),
        }
        self.select_id(&task.id);
        self.mark_dirty(now);
    }

    // ---- input forms ----

    pub fn start_add_task(&mut self) {
        self.input_form = Some(InputFormState::new(String::new(), DEFAULT_MINUTES.to_string(), 0, None));
        self.ui_mode = UiMode::AddingTask;
    }

    /// Add a subtask under the selected task (or the selected subtask's parent)
    pub fn start_add_subtask(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        if task.is_break() {
            return;
        }
        let parent_id = task.parent_id.clone().unwrap_or_else(|| task.id.clone());
        self.input_form = Some(InputFormState::new(String::new(), "10".to_string(), 0, Some(parent_id)));
        self.ui_mode = UiMode::AddingSubtask;
    }

    pub fn start_edit_title(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        self.input_form = Some(InputFormState::new(task.title.clone(), String::new(), 0, Some(task.id.clone())));
        self.ui_mode = UiMode::EditingTitle;
    }

    pub fn start_edit_minutes(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let minutes = task.estimate_minutes.to_string();
        self.input_form = Some(InputFormState::new(String::new(), minutes, 1, Some(task.id.clone())));
        self.ui_mode = UiMode::EditingMinutes;
    }

    /// Toggle between title and minutes (only forms that have both)
    pub fn input_form_toggle_field(&mut self) {
        if !matches!(self.ui_mode, UiMode::AddingTask | UiMode::AddingSubtask) {
            return;
        }
        if let Some(form) = &mut self.input_form {
            form.editing_field = (form.editing_field + 1) % 2;
        }
    }

    pub fn input_form_add_char(&mut self, c: char) {
        if let Some(form) = &mut self.input_form {
            match form.editing_field {
                0 => form.title.push(c),
                _ if c.is_ascii_digit() || c == '.' => form.minutes.push(c),
                _ => {}
            }
        }
    }

    pub fn input_form_backspace(&mut self) {
        if let Some(form) = &mut self.input_form {
            match form.editing_field {
                0 => {
                    form.title.pop();
                }
                _ => {
                    form.minutes.pop();
                }
            }
        }
    }

    pub fn submit_input_form(&mut self, now: EpochMs) {
        let Some(form) = self.input_form.take() else {
            return;
        };
        let mode = self.ui_mode;
        self.ui_mode = UiMode::Normal;

        let title = form.title.trim().to_string();
        let minutes = form.parsed_minutes();
        let changed_id = match (mode, form.target_id.as_deref()) {
            (UiMode::AddingTask, _) if !title.is_empty() => Some(self.session.add_task(title, minutes, now)),
            (UiMode::AddingSubtask, Some(parent_id)) if !title.is_empty() => {
                self.session.add_subtask(parent_id, title, minutes, now)
            }
            (UiMode::EditingTitle, Some(id)) if !title.is_empty() => {
                self.session.edit_title(id, title).then(|| id.to_string())
            }
            (UiMode::EditingMinutes, Some(id)) => self.session.edit_minutes(id, minutes).then(|| id.to_string()),
            _ => None,
        };

        if let Some(id) = changed_id {
            self.select_id(&id);
            self.mark_dirty(now);
        }
    }

    pub fn cancel_input_form(&mut self) {
        self.input_form = None;
        self.ui_mode = UiMode::Normal;
    }

    // ---- plan actions ----

    /// Nudge the selected task's estimate by `delta` minutes
    pub fn adjust_selected_minutes(&mut self, delta: i64, now: EpochMs) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let id = task.id.clone();
        let minutes = i64::from(task.estimate_minutes) + delta;
        if self.session.edit_minutes(&id, minutes as f64) {
            self.mark_dirty(now);
        }
    }

    pub fn toggle_done_selected(&mut self, now: EpochMs) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let title = self.selected_task().map(|t| t.title.clone()).unwrap_or_default();
        if self.session.toggle_done(&id) == Some(TaskStatus::Done) {
            self.celebrate(&title, now);
        }
        self.select_id(&id);
        self.mark_dirty(now);
    }

    pub fn toggle_later_selected(&mut self, now: EpochMs) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let is_top_level = self.selected_task().is_some_and(Task::is_top_level);
        if is_top_level && self.session.toggle_in_sprint(&id) {
            self.select_id(&id);
            self.mark_dirty(now);
        }
    }

    pub fn duplicate_selected(&mut self, now: EpochMs) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if let Some(new_id) = self.session.duplicate_task(&id, now) {
            self.select_id(&new_id);
            self.mark_dirty(now);
        }
    }

    pub fn delete_selected(&mut self, now: EpochMs) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if !self.session.delete_task(&id).is_empty() {
            self.clamp_selection();
            self.mark_dirty(now);
        }
    }

    /// Add a break: next in line while running, end of the sprint while planning
    pub fn insert_break(&mut self, minutes: u32, now: EpochMs) {
        let id = if self.is_running() {
            self.session.insert_break_next(minutes, now)
        } else {
            self.session.insert_break_in_plan(minutes, now)
        };
        self.select_id(&id);
        self.mark_dirty(now);
    }

    pub fn trim_to_fit(&mut self, now: EpochMs) {
        let deferred = self.session.trim_to_fit(now);
        let message = match deferred {
            0 => "Everything fits.".to_string(),
            1 => "Moved 1 item to later.".to_string(),
            n => format!("Moved {} items to later.", n),
        };
        self.show_toast(message, TOAST_MS, now);
        if deferred > 0 {
            self.clamp_selection();
            self.mark_dirty(now);
        }
    }

    pub fn cycle_cutoff(&mut self, now: EpochMs) {
        self.session.cycle_latest_finish();
        self.mark_dirty(now);
    }

    pub fn start_sprint(&mut self, now: EpochMs) {
        if self.session.start_sprint(now) {
            self.mark_dirty(now);
        } else {
            self.show_toast("Nothing in the sprint to start.", TOAST_MS, now);
        }
    }

    // ---- command line ----

    /// Add a task from the `add` subcommand; `parent` makes it a subtask
    pub fn add_from_cli(
        &mut self,
        title: String,
        minutes: f64,
        later: bool,
        parent: Option<&str>,
        now: EpochMs,
    ) -> Option<String> {
        let id = match parent {
            Some(parent_id) => self.session.add_subtask(parent_id, title, minutes, now)?,
            None => {
                let id = self.session.add_task(title, minutes, now);
                if later {
                    self.session.toggle_in_sprint(&id);
                }
                id
            }
        };
        self.mark_dirty(now);
        Some(id)
    }

    /// Plain-text summary for the `status` subcommand
    pub fn status_lines(&self, now: EpochMs) -> Vec<String> {
        let session = &self.session;
        let mode = if self.is_running() { "run" } else { "plan" };
        let active = match session.active_task() {
            Some(task) => format!(
                "{} ({} left)",
                task.title,
                format_countdown(session.active_remaining_ms(now))
            ),
            None => "none".to_string(),
        };
        let next = session
            .next_step_id()
            .and_then(|id| session.store().get(&id))
            .map_or_else(|| "none".to_string(), |t| t.title.clone());

        let latest = format_minutes_of_day(i64::from(session.settings.latest_finish_minutes));
        let finish = format_clock(session.projected_finish(now));
        let projection = if session.is_projected_past_cutoff(now) {
            format!("{}, after the {} cutoff", finish, latest)
        } else {
            format!("{} (latest {})", finish, latest)
        };

        vec![
            format!("Mode:             {}", mode),
            format!("Active:           {}", active),
            format!("Next:             {}", next),
            format!("Planned:          {}", format_total_minutes(session.planned_minutes())),
            format!("Projected finish: {}", projection),
        ]
    }

    // ---- run actions ----

    pub fn done_active(&mut self, now: EpochMs) {
        let effects = self.session.done_active(now);
        if !effects.is_empty() {
            self.apply_effects(effects, now);
            self.mark_dirty(now);
        }
    }

    pub fn toggle_pause(&mut self, now: EpochMs) {
        if self.session.toggle_pause(now) {
            self.mark_dirty(now);
        }
    }

    pub fn start_next(&mut self, now: EpochMs) {
        if self.session.active_task().is_some() {
            return;
        }
        if self.session.start_next(now) {
            self.mark_dirty(now);
        }
    }

    pub fn extend_active(&mut self, minutes: u32, now: EpochMs) {
        if self.session.extend_active(minutes) {
            self.time_up_notified = None;
            self.mark_dirty(now);
        }
    }

    pub fn reduce_active(&mut self, minutes: u32, now: EpochMs) {
        if self.session.reduce_active(minutes) {
            self.mark_dirty(now);
        }
    }

    pub fn stop_after_this_task(&mut self, now: EpochMs) {
        self.session.stop_after_this_task();
        self.show_toast("Will stop after this task.", TOAST_MS, now);
        self.mark_dirty(now);
    }

    pub fn delete_active(&mut self, now: EpochMs) {
        if !self.session.delete_active().is_empty() {
            self.clamp_selection();
            self.mark_dirty(now);
        }
    }

    pub fn exit_to_plan(&mut self, now: EpochMs) {
        self.session.exit_to_plan();
        self.mark_dirty(now);
    }
}
