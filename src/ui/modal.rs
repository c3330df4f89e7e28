use crate::app::AppState;
use crate::domain::count_steps;
use crate::ui::{
    layout::create_modal_area,
    styles::{modal_bg_style, modal_title_style},
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn complete_lines(app: &AppState) -> Vec<Line<'static>> {
    let (done, total) = count_steps(app.session.tasks());
    vec![
        Line::raw(""),
        Line::raw("  Every step in the sprint is done."),
        Line::raw(format!("  {}/{} steps completed today.", done, total)),
        Line::raw(""),
        Line::from(vec![
            Span::styled("  [Esc]", modal_title_style()),
            Span::raw(" Back to plan  "),
            Span::styled("[q]", modal_title_style()),
            Span::raw(" Quit"),
        ]),
    ]
}

/// Render the sprint-complete view
pub fn render_complete_modal(f: &mut Frame, app: &AppState, area: Rect) {
    let modal_area = create_modal_area(area, 8);

    // Clear the area behind the modal
    f.render_widget(Clear, modal_area);

    let paragraph = Paragraph::new(complete_lines(app))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Sprint complete ", modal_title_style()))
                .style(modal_bg_style()),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, modal_area);
}
