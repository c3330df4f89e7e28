use super::enums::TaskStatus;
use super::task::{clamp_minutes, EpochMs, IdGenerator, Task};
use std::collections::HashMap;
use tracing::warn;

/// Top-level ordering bucket, in display/run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bucket {
    /// The task currently counting down
    Active,
    /// Queued in the current sprint
    Sprint,
    /// Queued but deferred out of the sprint
    Later,
    Done,
}

impl Bucket {
    /// Bucket of a top-level task. Active tasks are always in the sprint
    /// (deferring the active task is refused), so status alone decides them.
    pub fn of(task: &Task) -> Self {
        match task.status {
            TaskStatus::Active => Self::Active,
            TaskStatus::Queued if task.in_sprint => Self::Sprint,
            TaskStatus::Queued => Self::Later,
            TaskStatus::Done => Self::Done,
        }
    }
}

/// Canonical ordering: top-level tasks grouped by bucket (stable within a
/// bucket), each immediately followed by its children in their existing order.
///
/// Children whose parent is missing, or whose parent is itself a child,
/// have nowhere to go and are dropped.
pub fn normalize(tasks: Vec<Task>) -> Vec<Task> {
    let total = tasks.len();
    let (mut top, children): (Vec<Task>, Vec<Task>) =
        tasks.into_iter().partition(Task::is_top_level);

    let mut by_parent: HashMap<String, Vec<Task>> = HashMap::new();
    for child in children {
        let parent_id = child.parent_id.clone().unwrap_or_default();
        by_parent.entry(parent_id).or_default().push(child);
    }

    top.sort_by_key(Bucket::of);

    let mut ordered = Vec::with_capacity(total);
    for task in top {
        let kids = by_parent.remove(&task.id);
        ordered.push(task);
        if let Some(kids) = kids {
            ordered.extend(kids);
        }
    }

    let orphans: usize = by_parent.values().map(Vec::len).sum();
    if orphans > 0 {
        warn!(orphans, "dropping subtasks without a top-level parent");
    }

    ordered
}

/// The task collection, always kept in normalized order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: normalize(tasks),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Children of `parent_id`, in order
    pub fn children<'a>(&'a self, parent_id: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |t| t.is_child_of(parent_id))
    }

    /// Whether the task is a container-only parent
    pub fn has_children(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.is_child_of(id))
    }

    pub fn top_level(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.is_top_level())
    }

    /// Top-level tasks that are in the sprint and not done
    pub fn sprint_top_level(&self) -> impl Iterator<Item = &Task> {
        self.top_level()
            .filter(|t| t.in_sprint && t.status != TaskStatus::Done)
    }

    fn renormalize(&mut self) {
        let tasks = std::mem::take(&mut self.tasks);
        self.tasks = normalize(tasks);
    }

    /// Add a task at the front of the working set
    pub fn add_task(&mut self, ids: &mut dyn IdGenerator, title: String, minutes: f64, now: EpochMs) -> String {
        let task = Task::new(ids.next_id(), title, minutes, now);
        let id = task.id.clone();
        self.tasks.insert(0, task);
        self.renormalize();
        id
    }

    /// Add a subtask after the parent's existing children.
    /// Returns `None` when the parent is missing, is a break, or is itself a subtask.
    pub fn add_subtask(
        &mut self,
        ids: &mut dyn IdGenerator,
        parent_id: &str,
        title: String,
        minutes: f64,
        now: EpochMs,
    ) -> Option<String> {
        let parent_idx = self.position(parent_id)?;
        let parent = &self.tasks[parent_idx];
        if parent.is_break() || !parent.is_top_level() {
            return None;
        }

        let mut insert_at = parent_idx + 1;
        while insert_at < self.tasks.len() && self.tasks[insert_at].is_child_of(parent_id) {
            insert_at += 1;
        }

        let subtask = Task::new_subtask(ids.next_id(), parent_id, title, minutes, now);
        let id = subtask.id.clone();
        self.tasks.insert(insert_at, subtask);
        self.sync_parent_status(parent_id);
        self.renormalize();
        Some(id)
    }

    /// Insert a break that runs next (front of the working set)
    pub fn insert_break_next(&mut self, ids: &mut dyn IdGenerator, minutes: u32, now: EpochMs) -> String {
        let brk = Task::new_break(ids.next_id(), minutes, now);
        let id = brk.id.clone();
        self.tasks.insert(0, brk);
        self.renormalize();
        id
    }

    /// Insert a break at the end of the sprint queue
    pub fn insert_break_in_plan(&mut self, ids: &mut dyn IdGenerator, minutes: u32, now: EpochMs) -> String {
        let brk = Task::new_break(ids.next_id(), minutes, now);
        let id = brk.id.clone();
        let insert_at = self
            .tasks
            .iter()
            .position(|t| t.is_top_level() && Bucket::of(t) > Bucket::Sprint)
            .unwrap_or(self.tasks.len());
        self.tasks.insert(insert_at, brk);
        self.renormalize();
        id
    }

    /// Clone a task (and its children, for a parent) right after the original
    pub fn duplicate_task(&mut self, ids: &mut dyn IdGenerator, id: &str, now: EpochMs) -> Option<String> {
        let idx = self.position(id)?;
        let original = self.tasks[idx].clone();

        let fresh = |task: &Task, new_id: String| Task {
            id: new_id,
            status: TaskStatus::Queued,
            created_at: now,
            ..task.clone()
        };

        let new_id = ids.next_id();
        if original.is_top_level() {
            let kids: Vec<Task> = self.children(id).cloned().collect();
            let mut group = Vec::with_capacity(kids.len() + 1);
            group.push(fresh(&original, new_id.clone()));
            for kid in &kids {
                let mut copy = fresh(kid, ids.next_id());
                copy.parent_id = Some(new_id.clone());
                group.push(copy);
            }
            let insert_at = idx + 1 + kids.len();
            self.tasks.splice(insert_at..insert_at, group);
        } else {
            self.tasks.insert(idx + 1, fresh(&original, new_id.clone()));
            if let Some(parent_id) = original.parent_id.as_deref() {
                self.sync_parent_status(parent_id);
            }
        }

        self.renormalize();
        Some(new_id)
    }

    pub fn edit_title(&mut self, id: &str, title: String) -> bool {
        let Some(task) = self.get_mut(id) else {
            return false;
        };
        task.title = title;
        true
    }

    /// Set the estimate, clamped to a positive whole number of minutes
    pub fn edit_minutes(&mut self, id: &str, minutes: f64) -> bool {
        let Some(task) = self.get_mut(id) else {
            return false;
        };
        task.estimate_minutes = clamp_minutes(minutes);
        true
    }

    /// Move a task between the sprint and "later".
    /// The active task cannot be deferred.
    pub fn toggle_in_sprint(&mut self, id: &str) -> bool {
        let Some(task) = self.get_mut(id) else {
            return false;
        };
        if task.status == TaskStatus::Active {
            return false;
        }
        task.in_sprint = !task.in_sprint;
        self.renormalize();
        true
    }

    /// Move several top-level tasks to "later" in one pass, keeping their
    /// relative order. The active task stays. Returns how many moved.
    pub fn defer_to_later(&mut self, ids: &[String]) -> usize {
        let mut moved = 0;
        for task in self.tasks.iter_mut() {
            if task.is_top_level()
                && task.in_sprint
                && task.status != TaskStatus::Active
                && ids.contains(&task.id)
            {
                task.in_sprint = false;
                moved += 1;
            }
        }
        if moved > 0 {
            self.renormalize();
        }
        moved
    }

    /// Flip done/queued. Parents cascade to their children; children
    /// recompute their parent. Un-completing a top-level task pulls it back
    /// into the sprint. Returns the new status.
    pub fn toggle_done(&mut self, id: &str) -> Option<TaskStatus> {
        let task = self.get(id)?;
        let next = if task.status == TaskStatus::Done {
            TaskStatus::Queued
        } else {
            TaskStatus::Done
        };

        match task.parent_id.clone() {
            None => {
                for t in self.tasks.iter_mut() {
                    if t.id == id {
                        t.status = next;
                        if next == TaskStatus::Queued {
                            t.in_sprint = true;
                        }
                    } else if t.is_child_of(id) {
                        t.status = next;
                    }
                }
            }
            Some(parent_id) => {
                if let Some(t) = self.get_mut(id) {
                    t.status = next;
                }
                self.sync_parent_status(&parent_id);
            }
        }

        self.renormalize();
        Some(next)
    }

    /// Set one task's status, recomputing its parent when it is a subtask
    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> bool {
        let Some(task) = self.get_mut(id) else {
            return false;
        };
        task.status = status;
        let parent_id = task.parent_id.clone();
        if let Some(parent_id) = parent_id {
            self.sync_parent_status(&parent_id);
        }
        self.renormalize();
        true
    }

    /// Demote every active task back to queued
    pub fn demote_active(&mut self) {
        for t in self.tasks.iter_mut().filter(|t| t.status == TaskStatus::Active) {
            t.status = TaskStatus::Queued;
        }
        self.renormalize();
    }

    /// Parent is done iff all of its children are done, else queued
    fn sync_parent_status(&mut self, parent_id: &str) {
        if !self.has_children(parent_id) {
            return;
        }
        let all_done = self.children(parent_id).all(|k| k.status == TaskStatus::Done);
        if let Some(parent) = self.get_mut(parent_id) {
            parent.status = if all_done {
                TaskStatus::Done
            } else {
                TaskStatus::Queued
            };
        }
    }

    /// Remove a task, cascading to its children. Returns the removed ids.
    pub fn delete_task(&mut self, id: &str) -> Vec<String> {
        let Some(task) = self.get(id) else {
            return Vec::new();
        };
        let parent_id = task.parent_id.clone();

        let mut removed = Vec::new();
        self.tasks.retain(|t| {
            let doomed = t.id == id || t.is_child_of(id);
            if doomed {
                removed.push(t.id.clone());
            }
            !doomed
        });

        if let Some(parent_id) = parent_id {
            self.sync_parent_status(&parent_id);
        }
        self.renormalize();
        removed
    }

    /// Reorder the queued sprint tasks (top level). Sprint tasks missing
    /// from `ordered_ids` keep their relative order at the end; unknown ids
    /// are ignored. Other buckets are untouched.
    pub fn reorder_sprint(&mut self, ordered_ids: &[String]) {
        let in_sprint_queue =
            |t: &Task| t.is_top_level() && Bucket::of(t) == Bucket::Sprint;

        let sprint_ids: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| in_sprint_queue(*t))
            .map(|t| t.id.clone())
            .collect();

        let mut order: Vec<String> = Vec::with_capacity(sprint_ids.len());
        for id in ordered_ids.iter().chain(sprint_ids.iter()) {
            if sprint_ids.contains(id) && !order.contains(id) {
                order.push(id.clone());
            }
        }

        let tasks = std::mem::take(&mut self.tasks);
        let (moving, rest): (Vec<Task>, Vec<Task>) = tasks.into_iter().partition(|t| {
            in_sprint_queue(t)
                || t.parent_id.as_ref().is_some_and(|p| sprint_ids.contains(p))
        });

        let mut by_id: HashMap<String, Task> =
            moving.iter().filter(|t| t.is_top_level()).map(|t| (t.id.clone(), t.clone())).collect();
        let mut reordered = Vec::with_capacity(moving.len() + rest.len());
        for id in &order {
            if let Some(parent) = by_id.remove(id) {
                reordered.push(parent);
                reordered.extend(moving.iter().filter(|t| t.is_child_of(id)).cloned());
            }
        }
        reordered.extend(rest);
        self.tasks = normalize(reordered);
    }

    /// Reorder one parent's children. Children missing from the order are
    /// appended at the end rather than dropped.
    pub fn reorder_subtasks(&mut self, parent_id: &str, ordered_child_ids: &[String]) -> bool {
        let Some(parent_idx) = self.position(parent_id) else {
            return false;
        };

        let tasks = std::mem::take(&mut self.tasks);
        let (kids, mut rest): (Vec<Task>, Vec<Task>) =
            tasks.into_iter().partition(|t| t.is_child_of(parent_id));

        let mut ordered: Vec<Task> = Vec::with_capacity(kids.len());
        for id in ordered_child_ids {
            if ordered.iter().any(|k| &k.id == id) {
                continue;
            }
            if let Some(kid) = kids.iter().find(|k| &k.id == id) {
                ordered.push(kid.clone());
            }
        }
        for kid in kids {
            if !ordered.iter().any(|k| k.id == kid.id) {
                ordered.push(kid);
            }
        }

        // Children always sit after their parent, so the parent's index is unchanged
        let insert_at = (parent_idx + 1).min(rest.len());
        rest.splice(insert_at..insert_at, ordered);
        self.tasks = normalize(rest);
        true
    }

    /// Grant extra minutes to a task
    pub fn add_extra_minutes(&mut self, id: &str, minutes: u32) -> bool {
        let Some(task) = self.get_mut(id) else {
            return false;
        };
        task.extra_minutes = task.extra_minutes.saturating_add(minutes);
        true
    }

    /// Take minutes away: extra time first, then the estimate, never below 1
    pub fn reduce_minutes(&mut self, id: &str, minutes: u32) -> bool {
        let Some(task) = self.get_mut(id) else {
            return false;
        };
        let from_extra = minutes.min(task.extra_minutes);
        task.extra_minutes -= from_extra;
        let remainder = minutes - from_extra;
        task.estimate_minutes = task.estimate_minutes.saturating_sub(remainder).max(1);
        true
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::arbitrary::{task_list, task_list_with_orphans};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn normalize_is_idempotent(tasks in task_list_with_orphans()) {
            let once = normalize(tasks);
            let twice = normalize(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalize_keeps_children_after_their_parent(tasks in task_list_with_orphans()) {
            let normalized = normalize(tasks);
            let mut current_parent: Option<&str> = None;
            for task in &normalized {
                match task.parent_id.as_deref() {
                    None => current_parent = Some(task.id.as_str()),
                    Some(parent) => prop_assert_eq!(Some(parent), current_parent),
                }
            }
        }

        #[test]
        fn normalize_keeps_every_rooted_task(tasks in task_list()) {
            let count = tasks.len();
            prop_assert_eq!(normalize(tasks).len(), count);
        }

        #[test]
        fn normalize_orders_buckets(tasks in task_list()) {
            let store = TaskStore::new(tasks);
            let buckets: Vec<Bucket> = store
                .tasks()
                .iter()
                .filter(|t| t.is_top_level())
                .map(Bucket::of)
                .collect();
            prop_assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
