#[cfg(test)]
pub mod arbitrary;
pub mod enums;
pub mod runner;
pub mod store;
pub mod task;
pub mod views;

pub use enums::{Mode, TaskStatus, UiMode};
pub use runner::{RunnerState, Settings, AUTO_START_GRACE_MS};
pub use store::{normalize, Bucket, TaskStore};
pub use task::{minutes_to_ms, EpochMs, IdGenerator, Task, UuidIds, MS_PER_MINUTE};
pub use views::{count_steps, flatten_tasks, status_badge, tree_connector, FlatRow};
