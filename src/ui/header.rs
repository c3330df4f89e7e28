use crate::app::AppState;
use crate::domain::{count_steps, EpochMs};
use crate::sprint::format::{format_clock, format_minutes_of_day, format_total_minutes};
use crate::ui::styles::{border_style, default_style, title_style, warning_style};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Shown when the sprint would run past the latest finish time
pub fn cutoff_warning(latest: &str) -> String {
    format!(
        "Projected finish is after {}. Consider trimming or stopping after this task.",
        latest
    )
}

pub fn header_lines(app: &AppState, now: EpochMs) -> Vec<Line<'static>> {
    let session = &app.session;
    let latest = format_minutes_of_day(i64::from(session.settings.latest_finish_minutes));
    let past_cutoff = session.is_projected_past_cutoff(now);

    let finish_style = if past_cutoff { warning_style() } else { default_style() };
    let clock = Line::from(vec![
        Span::styled("Now ", title_style()),
        Span::raw(format_clock(now)),
        Span::raw("   "),
        Span::styled("Projected finish ", title_style()),
        Span::styled(format_clock(session.projected_finish(now)), finish_style),
        Span::raw("   "),
        Span::styled("Latest ", title_style()),
        Span::raw(latest.clone()),
    ]);

    let second = if past_cutoff {
        Line::from(Span::styled(cutoff_warning(&latest), warning_style()))
    } else {
        let (done, total) = count_steps(session.tasks());
        Line::from(vec![
            Span::styled("Planned ", title_style()),
            Span::raw(format_total_minutes(session.planned_minutes())),
            Span::raw(format!("   {}/{} steps done", done, total)),
        ])
    };

    vec![clock, second]
}

/// Render the clock and projection header
pub fn render_header(f: &mut Frame, app: &AppState, area: Rect, now: EpochMs) {
    let paragraph = Paragraph::new(header_lines(app, now)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title(Span::styled(" CalmSprint ", title_style())),
    );
    f.render_widget(paragraph, area);
}
