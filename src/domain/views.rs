use super::enums::TaskStatus;
use super::store::Bucket;
use super::task::Task;

/// A flattened row for rendering the task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    /// Index in the flattened list
    pub index: usize,
    /// Depth in the tree (0 = top level, 1 = subtask)
    pub depth: usize,
    /// Whether this is the last subtask of its parent
    pub is_last: bool,
    /// Index into the normalized task slice
    pub task_index: usize,
}

/// Turn the normalized task list into render rows.
/// Children already follow their parent, so only depth and last-sibling
/// markers need computing.
pub fn flatten_tasks(tasks: &[Task]) -> Vec<FlatRow> {
    tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| {
            let depth = usize::from(!task.is_top_level());
            let is_last = depth == 1
                && tasks
                    .get(idx + 1)
                    .map_or(true, |next| next.parent_id != task.parent_id);
            FlatRow {
                index: idx,
                depth,
                is_last,
                task_index: idx,
            }
        })
        .collect()
}

/// Completed vs total leaf steps (breaks and tasks without children)
pub fn count_steps(tasks: &[Task]) -> (usize, usize) {
    let is_leaf = |t: &Task| !tasks.iter().any(|c| c.is_child_of(&t.id));
    let leaves: Vec<&Task> = tasks.iter().filter(|t| is_leaf(t)).collect();
    let done = leaves.iter().filter(|t| t.status == TaskStatus::Done).count();
    (done, leaves.len())
}

/// Badge text for a row: the bucket for top-level tasks, the status for subtasks
pub fn status_badge(task: &Task) -> &'static str {
    if !task.is_top_level() {
        return match task.status {
            TaskStatus::Active => "▶",
            TaskStatus::Queued => "·",
            TaskStatus::Done => "✓",
        };
    }
    match Bucket::of(task) {
        Bucket::Active => "ACTIVE",
        Bucket::Sprint => "SPRINT",
        Bucket::Later => "LATER",
        Bucket::Done => "DONE",
    }
}

/// Get tree connector for subtasks
pub fn tree_connector(is_last: bool) -> &'static str {
    if is_last {
        "└─"
    } else {
        "├─"
    }
}
