use crate::app::AppState;
use crate::domain::EpochMs;
use crate::sprint::clock::{active_ends_at, auto_start_remaining_ms, is_time_up};
use crate::sprint::format::{format_clock, format_countdown};
use crate::ui::styles::{
    active_style, border_style, default_style, paused_style, title_style, tree_style, warning_style,
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn active_lines(app: &AppState, now: EpochMs) -> Option<Vec<Line<'static>>> {
    let session = &app.session;
    let task = session.active_task()?;
    let runner = &session.runner;
    let store = session.store();

    let title = match session.active_parent() {
        Some(parent) => format!("{} › {}", parent.title, task.title),
        None => task.title.clone(),
    };
    let mut lines = vec![
        Line::from(vec![Span::styled("Now: ", title_style()), Span::raw(title)]),
        Line::raw(""),
    ];

    if is_time_up(now, runner, store) {
        lines.push(Line::from(Span::styled(
            "Time's up. Mark it done or add a few minutes.",
            warning_style(),
        )));
    } else {
        let style = if runner.is_active_paused() { paused_style() } else { active_style() };
        let mut countdown = vec![Span::styled(
            format_countdown(session.active_remaining_ms(now)),
            style,
        )];
        if runner.is_active_paused() {
            countdown.push(Span::styled("  paused", paused_style()));
        }
        lines.push(Line::from(countdown));
    }

    if let Some(ends_at) = active_ends_at(runner, store) {
        lines.push(Line::from(vec![
            Span::styled("Ends at ", tree_style()),
            Span::raw(format_clock(ends_at)),
        ]));
    }
    if runner.stop_after_this_task {
        lines.push(Line::from(Span::styled(
            "Stopping after this task.",
            paused_style(),
        )));
    }
    Some(lines)
}

fn waiting_lines(app: &AppState, now: EpochMs) -> Vec<Line<'static>> {
    let runner = &app.session.runner;
    if app.session.sprint_is_complete() {
        return vec![Line::from(Span::styled("Sprint complete.", active_style()))];
    }
    match auto_start_remaining_ms(now, runner) {
        Some(remaining) => {
            let mut spans = vec![
                Span::raw("Next step starts in "),
                Span::styled(format_countdown(remaining), active_style()),
            ];
            if runner.is_auto_start_paused() {
                spans.push(Span::styled("  paused", paused_style()));
            }
            vec![Line::from(spans)]
        }
        None => vec![Line::raw("Ready for the next step. Press n to start.")],
    }
}

pub fn run_lines(app: &AppState, now: EpochMs) -> Vec<Line<'static>> {
    let mut lines = active_lines(app, now).unwrap_or_else(|| waiting_lines(app, now));

    let next = app
        .session
        .next_step_id()
        .and_then(|id| app.session.store().get(&id));
    if let Some(next) = next {
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("Up next: ", title_style()),
            Span::styled(next.title.clone(), default_style()),
        ]));
    }
    lines
}

/// Render the running sprint: countdown, pause state and what comes next
pub fn render_run_pane(f: &mut Frame, app: &AppState, area: Rect, now: EpochMs) {
    let paragraph = Paragraph::new(run_lines(app, now))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style())
                .title(Span::styled(" Sprint ", title_style())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);
}
