use super::files::{atomic_write, read_file, state_file};
use crate::domain::{normalize, Mode, RunnerState, Settings, Task, TaskStatus};
use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const STATE_VERSION: u64 = 1;

/// Everything that survives a restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u64,
    pub tasks: Vec<Task>,
    pub runner: RunnerState,
    pub settings: Settings,
}

impl PersistedState {
    pub fn new(tasks: Vec<Task>, runner: RunnerState, settings: Settings) -> Self {
        Self {
            version: STATE_VERSION,
            tasks,
            runner,
            settings,
        }
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a stored record, validating each top-level field on its own.
    ///
    /// A field that fails validation is replaced by its default instead of
    /// discarding the record; tasks are filtered one by one. Returns `None`
    /// only when the input is not a version-1 record at all.
    pub fn from_json(input: &str) -> Option<Self> {
        let value: Value = match serde_json::from_str(input) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "stored state is not valid JSON; starting fresh");
                return None;
            }
        };
        let record = value.as_object()?;
        if record.get("version").and_then(Value::as_u64) != Some(STATE_VERSION) {
            warn!("stored state has an unknown version; starting fresh");
            return None;
        }

        let tasks: Vec<Task> = match record.get("tasks").and_then(Value::as_array) {
            Some(items) => {
                let tasks: Vec<Task> = items.iter().filter_map(|v| Task::deserialize(v).ok()).collect();
                if tasks.len() < items.len() {
                    warn!(dropped = items.len() - tasks.len(), "skipping malformed tasks");
                }
                tasks
            }
            None => {
                warn!("stored tasks are malformed; using an empty list");
                Vec::new()
            }
        };

        let runner = record
            .get("runner")
            .and_then(|v| RunnerState::deserialize(v).ok())
            .unwrap_or_else(|| {
                warn!("stored runner is malformed; using defaults");
                RunnerState::default()
            });

        let mut settings = record
            .get("settings")
            .and_then(|v| Settings::deserialize(v).ok())
            .unwrap_or_else(|| {
                warn!("stored settings are malformed; using defaults");
                Settings::default()
            });
        settings.set_latest_finish(settings.latest_finish_minutes);

        // Orphans go first so the runner cannot keep pointing at one
        let (tasks, runner) = reconcile_active(normalize(tasks), runner);
        Some(Self::new(normalize(tasks), runner, settings))
    }
}

/// Restore "at most one active task" after a restart: the runner's task is
/// active again (unless done), every other active task is queued, and a
/// runner pointing at nothing is released.
fn reconcile_active(mut tasks: Vec<Task>, mut runner: RunnerState) -> (Vec<Task>, RunnerState) {
    let active_id = runner.active_task_id.clone();

    for task in tasks.iter_mut() {
        if active_id.as_deref() == Some(task.id.as_str()) {
            if task.status != TaskStatus::Done {
                task.status = TaskStatus::Active;
                task.in_sprint = true;
            }
        } else if task.status == TaskStatus::Active {
            debug!(task_id = %task.id, "demoting stale active task");
            task.status = TaskStatus::Queued;
        }
    }

    if let Some(id) = active_id {
        let found = tasks
            .iter()
            .any(|t| t.id == id && t.status == TaskStatus::Active);
        if !found {
            warn!(task_id = %id, "runner points at a missing or finished task; releasing it");
            runner.clear_active();
            runner.awaiting_next_start = runner.mode == Mode::Run;
        }
    }

    (tasks, runner)
}

/// Where the persisted record lives
pub trait Storage {
    /// The stored state, or `None` when there is nothing usable
    fn load(&self) -> Option<PersistedState>;

    fn save(&mut self, state: &PersistedState) -> Result<(), StorageError>;
}

/// `state.json` inside the data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: state_file(dir),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Option<PersistedState> {
        let content = match read_file(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "could not read stored state");
                return None;
            }
        };
        if content.trim().is_empty() {
            return None;
        }
        PersistedState::from_json(&content)
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StorageError> {
        let json = state.to_json()?;
        atomic_write(&self.path, &json)?;
        debug!(path = %self.path.display(), tasks = state.tasks.len(), "state saved");
        Ok(())
    }
}

/// In-memory storage that can be told to fail
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStorage {
    pub content: Option<String>,
    pub fail: bool,
    pub saves: usize,
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn load(&self) -> Option<PersistedState> {
        PersistedState::from_json(self.content.as_deref()?)
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::NoParentDirectory(PathBuf::from("memory")));
        }
        self.content = Some(state.to_json()?);
        self.saves += 1;
        Ok(())
    }
}
