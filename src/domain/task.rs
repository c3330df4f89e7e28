use super::enums::{TaskKind, TaskStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Milliseconds since the Unix epoch; every instant in the core uses this unit
pub type EpochMs = i64;

pub const MS_PER_MINUTE: i64 = 60_000;

/// Source of fresh task identifiers
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs, used by the running application
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic ids ("t1", "t2", ...) for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: u32,
}

#[cfg(test)]
impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("t{}", self.counter)
    }
}

/// Clamp user-provided minutes to a positive integer.
/// Non-finite input falls back to 1.
pub fn clamp_minutes(minutes: f64) -> u32 {
    if !minutes.is_finite() {
        return 1;
    }
    minutes.round().max(1.0) as u32
}

/// Convert whole minutes to milliseconds
pub fn minutes_to_ms(minutes: u32) -> i64 {
    i64::from(minutes) * MS_PER_MINUTE
}

/// A task, break or subtask in the sprint list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "lenient::estimate_minutes")]
    pub estimate_minutes: u32,
    /// Additional time granted after the task started
    #[serde(deserialize_with = "lenient::extra_minutes")]
    pub extra_minutes: u32,
    pub status: TaskStatus,
    pub kind: TaskKind,
    /// Weak back-reference to the parent task (one level deep)
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Member of the current sprint, as opposed to "later"
    pub in_sprint: bool,
    #[serde(deserialize_with = "lenient::epoch_ms")]
    pub created_at: EpochMs,
}

impl Task {
    pub fn new(id: String, title: String, minutes: f64, now: EpochMs) -> Self {
        Self {
            id,
            title,
            estimate_minutes: clamp_minutes(minutes),
            extra_minutes: 0,
            status: TaskStatus::Queued,
            kind: TaskKind::Task,
            parent_id: None,
            in_sprint: true,
            created_at: now,
        }
    }

    /// Create a queued break step
    pub fn new_break(id: String, minutes: u32, now: EpochMs) -> Self {
        Self {
            kind: TaskKind::Break,
            ..Self::new(id, "Break".to_string(), f64::from(minutes), now)
        }
    }

    /// Create a queued subtask of `parent_id`
    pub fn new_subtask(id: String, parent_id: &str, title: String, minutes: f64, now: EpochMs) -> Self {
        Self {
            parent_id: Some(parent_id.to_string()),
            ..Self::new(id, title, minutes, now)
        }
    }

    /// Estimate plus extra time, in whole minutes
    pub fn total_minutes(&self) -> u32 {
        self.estimate_minutes.saturating_add(self.extra_minutes)
    }

    pub fn total_ms(&self) -> i64 {
        minutes_to_ms(self.total_minutes())
    }

    pub fn is_break(&self) -> bool {
        self.kind == TaskKind::Break
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_child_of(&self, parent_id: &str) -> bool {
        self.parent_id.as_deref() == Some(parent_id)
    }
}

/// Deserializers accepting any JSON number and clamping it into range,
/// so a hand-edited state file never loses a task over `25.0` vs `25`.
mod lenient {
    use super::clamp_minutes;
    use serde::{Deserialize, Deserializer};

    pub fn estimate_minutes<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        Ok(clamp_minutes(f64::deserialize(d)?))
    }

    pub fn extra_minutes<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let value = f64::deserialize(d)?;
        if !value.is_finite() {
            return Ok(0);
        }
        Ok(value.round().max(0.0) as u32)
    }

    pub fn epoch_ms<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let value = f64::deserialize(d)?;
        if !value.is_finite() {
            return Ok(0);
        }
        Ok(value.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_minutes() {
        assert_eq!(clamp_minutes(25.0), 25);
        assert_eq!(clamp_minutes(24.6), 25);
        assert_eq!(clamp_minutes(0.0), 1);
        assert_eq!(clamp_minutes(-10.0), 1);
        assert_eq!(clamp_minutes(f64::NAN), 1);
        assert_eq!(clamp_minutes(f64::INFINITY), 1);
    }

    #[test]
    fn test_task_new() {
        let task = Task::new("t1".to_string(), "Write report".to_string(), 25.0, 1_000);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.estimate_minutes, 25);
        assert_eq!(task.extra_minutes, 0);
        assert_eq!(task.status, TaskStatus::Queued);
        assert_eq!(task.kind, TaskKind::Task);
        assert!(task.in_sprint);
        assert!(task.is_top_level());
        assert_eq!(task.created_at, 1_000);
    }

    #[test]
    fn test_break_and_subtask_constructors() {
        let brk = Task::new_break("b1".to_string(), 5, 0);
        assert!(brk.is_break());
        assert_eq!(brk.title, "Break");
        assert!(brk.parent_id.is_none());

        let sub = Task::new_subtask("s1".to_string(), "p1", "Outline".to_string(), 10.0, 0);
        assert!(sub.is_child_of("p1"));
        assert!(!sub.is_top_level());
    }

    #[test]
    fn test_total_minutes() {
        let mut task = Task::new("t1".to_string(), "A".to_string(), 25.0, 0);
        task.extra_minutes = 10;
        assert_eq!(task.total_minutes(), 35);
        assert_eq!(task.total_ms(), 35 * 60_000);
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let mut ids = UuidIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let task = Task::new("t1".to_string(), "A".to_string(), 5.0, 42);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["estimateMinutes"], 5);
        assert_eq!(json["inSprint"], true);
        assert_eq!(json["parentId"], serde_json::Value::Null);
        assert_eq!(json["status"], "queued");
    }

    #[test]
    fn test_lenient_minutes_on_load() {
        let json = r#"{"id":"t1","title":"A","estimateMinutes":24.6,"extraMinutes":-3,
            "status":"queued","kind":"task","inSprint":true,"createdAt":1000.0}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.estimate_minutes, 25);
        assert_eq!(task.extra_minutes, 0);
        assert_eq!(task.parent_id, None);
        assert_eq!(task.created_at, 1000);
    }
}
