use super::clock::active_remaining_ms;
use super::SprintSession;
use crate::domain::{minutes_to_ms, EpochMs, RunnerState, Settings, Task, TaskStatus, TaskStore, MS_PER_MINUTE};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use tracing::info;

/// Minutes a top-level sprint item still needs, counting only children
/// matching `counts` for a container-only parent
fn item_minutes(store: &TaskStore, task: &Task, counts: impl Fn(&Task) -> bool) -> u32 {
    if task.is_break() || !store.has_children(&task.id) {
        return if counts(task) { task.total_minutes() } else { 0 };
    }
    store
        .children(&task.id)
        .filter(|&k| counts(k))
        .map(Task::total_minutes)
        .sum()
}

/// Remaining planned minutes for the sprint
pub fn sprint_planned_minutes(store: &TaskStore) -> u32 {
    store
        .sprint_top_level()
        .map(|t| item_minutes(store, t, |k| k.status != TaskStatus::Done))
        .sum()
}

/// When the sprint will finish if everything runs as planned from `now`
pub fn projected_finish(now: EpochMs, runner: &RunnerState, store: &TaskStore) -> EpochMs {
    let queued_minutes: u32 = store
        .sprint_top_level()
        .map(|t| item_minutes(store, t, |k| k.status == TaskStatus::Queued))
        .sum();
    now + active_remaining_ms(now, runner, store) + minutes_to_ms(queued_minutes)
}

/// Resolve a wall-clock time in `tz`. A time skipped by a DST jump is read
/// with the offset in force after the jump.
fn resolve_wall_clock<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<Tz>> {
    naive
        .and_local_timezone(tz.clone())
        .earliest()
        .or_else(|| (naive + Duration::hours(1)).and_local_timezone(tz.clone()).earliest())
}

/// Today's cutoff (local time) for the day containing `now`
pub fn cutoff_at(now: EpochMs, settings: &Settings) -> EpochMs {
    let minutes = settings.latest_finish_minutes;
    let Some(today) = Local.timestamp_millis_opt(now).single().map(|t| t.date_naive()) else {
        return now;
    };
    let Some(cutoff) = today.and_hms_opt(minutes / 60 % 24, minutes % 60, 0) else {
        return now;
    };
    resolve_wall_clock(cutoff, &Local).map_or(now, |t| t.timestamp_millis())
}

/// Strictly after the cutoff
pub fn is_projected_past_cutoff(now: EpochMs, projected_finish: EpochMs, settings: &Settings) -> bool {
    projected_finish > cutoff_at(now, settings)
}

impl SprintSession {
    pub fn planned_minutes(&self) -> u32 {
        sprint_planned_minutes(&self.store)
    }

    pub fn projected_finish(&self, now: EpochMs) -> EpochMs {
        projected_finish(now, &self.runner, &self.store)
    }

    pub fn is_projected_past_cutoff(&self, now: EpochMs) -> bool {
        is_projected_past_cutoff(now, self.projected_finish(now), &self.settings)
    }

    /// Defer queued sprint items that don't fit before the cutoff.
    ///
    /// Walks the sprint queue in order and keeps each item whose minutes
    /// still fit in the remaining budget; the rest move to "later".
    /// Returns how many items were deferred.
    pub fn trim_to_fit(&mut self, now: EpochMs) -> usize {
        let available_ms = cutoff_at(now, &self.settings) - now - self.active_remaining_ms(now);
        let mut budget = (available_ms / MS_PER_MINUTE).max(0);

        // Queued minutes only: an active child is already in the active remaining time
        let candidates: Vec<(String, u32, bool)> = self
            .store
            .sprint_top_level()
            .filter(|t| t.status == TaskStatus::Queued)
            .map(|t| {
                let minutes = item_minutes(&self.store, t, |k| k.status == TaskStatus::Queued);
                let running = self.store.children(&t.id).any(|k| k.status == TaskStatus::Active);
                (t.id.clone(), minutes, running)
            })
            .collect();

        let mut to_defer = Vec::new();
        for (id, minutes, running) in candidates {
            let minutes = i64::from(minutes);
            if running || minutes <= budget {
                budget -= minutes;
            } else {
                to_defer.push(id);
            }
        }
        let deferred = self.store.defer_to_later(&to_defer);

        if deferred > 0 {
            info!(deferred, "trimmed sprint to fit the cutoff");
        }
        deferred
    }
}
