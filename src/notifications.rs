//! Desktop notifications and praise lines. Fire-and-forget: nothing here
//! touches sprint state. Desktop notifications are macOS only.

#[cfg(target_os = "macos")]
use std::process::Command;

use rand::seq::SliceRandom;
use rand::Rng;

const PRAISE: [&str; 5] = [
    "Nice work. Keep it small and steady.",
    "Good job, one step at a time.",
    "That counts. Keep going.",
    "Momentum is built like this.",
    "Done. Breathe, then next.",
];

/// A random praise line for a completion
pub fn praise_for<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    PRAISE.choose(rng).copied().unwrap_or(PRAISE[0])
}

#[cfg(target_os = "macos")]
fn display(title: &str, message: &str) {
    let script = format!(
        r#"display notification "{}" with title "{}""#,
        message.replace('"', "\\\""),
        title
    );

    let _ = Command::new("osascript").arg("-e").arg(&script).output();
}

#[cfg(not(target_os = "macos"))]
fn display(_title: &str, _message: &str) {}

/// Celebrate a completed step
pub fn celebrate(task_title: &str, praise: &str) {
    display("CalmSprint - Done", &format!("{} · {}", task_title, praise));
}

/// The active task's countdown reached zero
pub fn notify_time_up(task_title: &str) {
    display("CalmSprint - Time's up", &format!("⏰ {}", task_title));
}

/// The next step started on its own after the grace period
pub fn notify_auto_started(task_title: &str) {
    display("CalmSprint - Next up", task_title);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_praise_comes_from_the_list() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert!(PRAISE.contains(&praise_for(&mut rng)));
        }
    }

    #[test]
    fn test_praise_is_repeatable_for_a_seed() {
        let mut first = StdRng::seed_from_u64(42);
        let mut second = StdRng::seed_from_u64(42);
        let a: Vec<_> = (0..10).map(|_| praise_for(&mut first)).collect();
        let b: Vec<_> = (0..10).map(|_| praise_for(&mut second)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_praise_varies() {
        let mut rng = StdRng::seed_from_u64(1);
        let picks: std::collections::HashSet<_> = (0..100).map(|_| praise_for(&mut rng)).collect();
        assert!(picks.len() > 1);
    }
}
