use crate::ui::styles::hint_style;
use ratatui::{layout::Rect, text::{Line, Span}, widgets::Paragraph, Frame};

/// Keybinding hint rows; each row stays under 100 columns
const PLAN_HINTS: [&[&str]; 2] = [
    &[
        " s start   ",
        "a add   ",
        "A subtask   ",
        "e/m edit   ",
        "+/- min   ",
        "y duplicate   ",
        "x delete   ",
        "q quit",
    ],
    &[
        " ↑/↓ select   ",
        "Shift+↑/↓ reorder   ",
        "space done   ",
        "l later   ",
        "b/B break   ",
        "t trim   ",
        "c cutoff",
    ],
];

const RUN_HINTS: [&[&str]; 2] = [
    &[
        " d done   ",
        "p pause   ",
        "n next   ",
        "S stop after   ",
        "Esc plan   ",
        "q quit",
    ],
    &[" 5/0 +5/+10   ", "r -5   ", "b/B break   ", "x delete"],
];

/// Number of rows the hint bar needs
pub const HINT_ROWS: u16 = 2;

/// Hint lines for the current mode
pub fn hint_lines(running: bool) -> Vec<Line<'static>> {
    let rows = if running { &RUN_HINTS } else { &PLAN_HINTS };
    rows.iter()
        .map(|row| Line::from(row.iter().map(|h| Span::raw(*h)).collect::<Vec<_>>()))
        .collect()
}

/// Render the keybindings hint bar
pub fn render_keybindings(f: &mut Frame, area: Rect, running: bool) {
    let paragraph = Paragraph::new(hint_lines(running)).style(hint_style());
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn all_text(running: bool) -> String {
        hint_lines(running).iter().map(text).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_hints_follow_mode() {
        let plan = all_text(false);
        assert!(plan.contains("s start"));
        assert!(plan.contains("q quit"));

        let run = all_text(true);
        assert!(run.contains("S stop after"));
        assert!(!run.contains("s start"));
    }

    #[test]
    fn test_hints_cover_every_plan_key() {
        let plan = all_text(false);
        for hint in ["y duplicate", "x delete", "t trim", "c cutoff", "l later"] {
            assert!(plan.contains(hint), "missing {}", hint);
        }
    }

    #[test]
    fn test_hint_rows_fit_narrow_terminals() {
        for running in [false, true] {
            let lines = hint_lines(running);
            assert_eq!(lines.len(), HINT_ROWS as usize);
            for line in &lines {
                assert!(line.width() <= 100, "{} is {} wide", text(line), line.width());
            }
        }
    }
}
