use serde::{Deserialize, Serialize};

/// Lifecycle status of a task, break or subtask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Active,
    Done,
}

impl TaskStatus {
    /// Convert status to its wire tag
    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Active => "active",
            Self::Done => "done",
        }
    }

    /// Queued or active (i.e. still part of the remaining work)
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Done)
    }
}

/// What kind of step a top-level entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Task,
    Break,
}

/// Runner mode: planning the sprint or running it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Plan,
    Run,
}

/// UI mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Normal,
    AddingTask,
    AddingSubtask,
    EditingTitle,
    EditingMinutes,
}
