//! proptest strategies for task lists and runner state

use super::enums::{Mode, TaskStatus};
use super::runner::{RunnerState, Settings};
use super::task::Task;
use proptest::prelude::*;

/// Parent id no generated task carries
const MISSING_PARENT: &str = "gone";

#[derive(Debug, Clone)]
enum Placement {
    TopLevel { in_sprint: bool, is_break: bool },
    /// Child of the n-th generated parent (modulo the parent count)
    Child(usize),
    Orphan,
}

#[derive(Debug, Clone)]
struct Draft {
    status: TaskStatus,
    placement: Placement,
    minutes: u32,
    extra: u32,
    created_at: i64,
}

fn status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        3 => Just(TaskStatus::Queued),
        1 => Just(TaskStatus::Active),
        2 => Just(TaskStatus::Done),
    ]
}

fn placement(with_orphans: bool) -> BoxedStrategy<Placement> {
    let top_level = (any::<bool>(), prop::bool::weighted(0.2))
        .prop_map(|(in_sprint, is_break)| Placement::TopLevel { in_sprint, is_break });
    let child = any::<usize>().prop_map(Placement::Child);
    if with_orphans {
        prop_oneof![4 => top_level, 4 => child, 1 => Just(Placement::Orphan)].boxed()
    } else {
        prop_oneof![top_level, child].boxed()
    }
}

fn draft(with_orphans: bool) -> impl Strategy<Value = Draft> {
    (status(), placement(with_orphans), 1u32..=120, 0u32..=30, 0i64..4_000_000_000_000).prop_map(
        |(status, placement, minutes, extra, created_at)| Draft {
            status,
            placement,
            minutes,
            extra,
            created_at,
        },
    )
}

fn build(drafts: Vec<Draft>) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(drafts.len());
    let mut parents: Vec<String> = Vec::new();

    for (i, draft) in drafts.into_iter().enumerate() {
        let minutes = f64::from(draft.minutes);
        let mut task = match draft.placement {
            Placement::Child(pick) if !parents.is_empty() => {
                let parent = &parents[pick % parents.len()];
                Task::new_subtask(format!("c{}", i), parent, format!("Step {}", i), minutes, 0)
            }
            Placement::Orphan => Task::new_subtask(format!("o{}", i), MISSING_PARENT, format!("Lost {}", i), minutes, 0),
            Placement::TopLevel { in_sprint, is_break: true } => Task {
                in_sprint,
                ..Task::new_break(format!("b{}", i), draft.minutes, 0)
            },
            Placement::TopLevel { in_sprint, is_break: false } => {
                parents.push(format!("t{}", i));
                Task {
                    in_sprint,
                    ..Task::new(format!("t{}", i), format!("Task {}", i), minutes, 0)
                }
            }
            // No parent generated yet: fall back to a plain sprint task
            Placement::Child(_) => {
                parents.push(format!("t{}", i));
                Task::new(format!("t{}", i), format!("Task {}", i), minutes, 0)
            }
        };
        task.status = draft.status;
        task.extra_minutes = draft.extra;
        task.created_at = draft.created_at;
        if task.status == TaskStatus::Active && task.is_top_level() {
            task.in_sprint = true;
        }
        tasks.push(task);
    }
    tasks
}

/// Task lists in arbitrary storage order; children may precede their
/// parents. Several tasks may claim to be active.
pub fn task_list() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(draft(false), 0..14)
        .prop_map(build)
        .prop_shuffle()
}

/// Like [`task_list`], with some subtasks pointing at a missing parent
pub fn task_list_with_orphans() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(draft(true), 0..14)
        .prop_map(build)
        .prop_shuffle()
}

fn optional_instant() -> impl Strategy<Value = Option<i64>> {
    prop::option::of(0i64..4_000_000_000_000)
}

/// A runner that may point at any of `tasks`, or at nothing
pub fn runner_for(tasks: &[Task]) -> impl Strategy<Value = RunnerState> {
    let mut candidates: Vec<Option<String>> = tasks.iter().map(|t| Some(t.id.clone())).collect();
    candidates.push(None);
    candidates.push(Some("missing".to_string()));

    (
        prop_oneof![Just(Mode::Plan), Just(Mode::Run)],
        prop::sample::select(candidates),
        optional_instant(),
        any::<bool>(),
        any::<bool>(),
        optional_instant(),
        0i64..3_600_000,
        (optional_instant(), optional_instant(), prop::option::of(0i64..15_000)),
    )
        .prop_map(
            |(
                mode,
                active_task_id,
                active_started_at,
                awaiting_next_start,
                stop_after_this_task,
                paused_at,
                pause_accumulated_ms,
                (auto_start_at, auto_start_paused_at, auto_start_paused_remaining_ms),
            )| RunnerState {
                mode,
                active_task_id,
                active_started_at,
                awaiting_next_start,
                stop_after_this_task,
                paused_at,
                pause_accumulated_ms,
                auto_start_at,
                auto_start_paused_at,
                auto_start_paused_remaining_ms,
            },
        )
}

pub fn settings() -> impl Strategy<Value = Settings> {
    (0u32..2_000).prop_map(|latest_finish_minutes| Settings { latest_finish_minutes })
}
