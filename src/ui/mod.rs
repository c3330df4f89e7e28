pub mod details_pane;
pub mod header;
pub mod input_form;
pub mod keybindings;
pub mod layout;
pub mod list_pane;
pub mod modal;
pub mod run_pane;
pub mod styles;

use crate::app::AppState;
use crate::domain::EpochMs;
use details_pane::render_details_pane;
use header::render_header;
use input_form::render_input_form;
use keybindings::render_keybindings;
use layout::create_layout;
use list_pane::render_list_pane;
use modal::render_complete_modal;
use ratatui::{text::Span, widgets::Paragraph, Frame};
use run_pane::render_run_pane;
use styles::toast_style;

/// Main render function - draws the entire UI
pub fn render(f: &mut Frame, app: &AppState, now: EpochMs) {
    let size = f.size();
    let layout = create_layout(size);
    let running = app.is_running();

    render_keybindings(f, layout.keybindings_area, running);
    render_header(f, app, layout.header_area, now);

    if running {
        render_run_pane(f, app, layout.main_area, now);
        render_list_pane(f, app, layout.side_area, false);
    } else {
        render_list_pane(f, app, layout.main_area, true);
        render_details_pane(f, app, layout.side_area);
    }

    if let Some(message) = app.toast_message(now) {
        let toast = Paragraph::new(Span::styled(format!(" {}", message), toast_style()));
        f.render_widget(toast, layout.toast_area);
    }

    if app.session.sprint_is_complete() {
        render_complete_modal(f, app, size);
    }

    if let Some(form) = &app.input_form {
        render_input_form(f, form, app.ui_mode, size);
    }
}
