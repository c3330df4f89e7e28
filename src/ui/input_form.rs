use crate::app::InputFormState;
use crate::domain::UiMode;
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

fn form_title(mode: UiMode) -> &'static str {
    match mode {
        UiMode::AddingSubtask => " Add Subtask ",
        UiMode::EditingTitle => " Edit Title ",
        UiMode::EditingMinutes => " Edit Minutes ",
        _ => " Add Task ",
    }
}

fn field_lines(label: &'static str, value: &str, editing: bool) -> [Line<'static>; 2] {
    let label = if editing {
        Line::raw(format!("{} (editing)", label))
    } else {
        Line::raw(label)
    };
    let value = Line::from(vec![
        Span::raw("> "),
        Span::styled(value.to_string(), modal_title_style()),
        if editing {
            Span::styled("█", modal_title_style()) // Cursor
        } else {
            Span::raw("")
        },
    ]);
    [label, value]
}

pub fn form_lines(form: &InputFormState, mode: UiMode) -> Vec<Line<'static>> {
    let mut lines = vec![Line::raw("")];

    if mode != UiMode::EditingMinutes {
        lines.extend(field_lines("Title:", &form.title, form.editing_field == 0));
        lines.push(Line::raw(""));
    }
    if mode != UiMode::EditingTitle {
        lines.extend(field_lines("Minutes:", &form.minutes, form.editing_field == 1));
        lines.push(Line::raw(""));
    }

    let hint = match mode {
        UiMode::AddingTask | UiMode::AddingSubtask => "Tab to switch fields  ·  Enter to submit  ·  Esc to cancel",
        _ => "Enter to save  ·  Esc to cancel",
    };
    lines.push(Line::raw(hint));
    lines
}

/// Render the input form for adding and editing tasks
pub fn render_input_form(f: &mut Frame, form: &InputFormState, mode: UiMode, area: Rect) {
    let modal_area = create_modal_area(area, 10);

    // Clear the area behind the form
    f.render_widget(Clear, modal_area);

    let paragraph = Paragraph::new(form_lines(form, mode))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(form_title(mode), modal_title_style()))
                .style(modal_bg_style()),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, modal_area);
}
