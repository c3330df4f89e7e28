use crate::domain::EpochMs;
use chrono::{Local, TimeZone};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Local wall-clock time as `HH:MM`
pub fn format_clock(ms: EpochMs) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(t) => t.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Minutes from midnight as `HH:MM`, wrapping around the day
pub fn format_minutes_of_day(minutes: i64) -> String {
    let m = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", m / 60, m % 60)
}

/// Countdown as `MM:SS` (minutes keep growing past 99)
pub fn format_countdown(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// `25m` under an hour, `1h 05m` above
pub fn format_total_minutes(minutes: u32) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    if h == 0 {
        format!("{}m", m)
    } else {
        format!("{}h {:02}m", h, m)
    }
}

/// Parse `HH:MM` (or `H:MM`) into minutes from midnight
pub fn parse_clock(input: &str) -> Option<u32> {
    let (h, m) = input.trim().split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    (h < 24 && m < 60).then_some(h * 60 + m)
}
