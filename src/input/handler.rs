use crate::app::{AppState, MINUTES_STEP};
use crate::domain::{EpochMs, UiMode};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Handle a key press. Returns true when the app should quit.
pub fn handle_key(app: &mut AppState, key: KeyEvent, now: EpochMs) -> bool {
    match app.ui_mode {
        UiMode::Normal if app.is_running() => handle_run_mode(app, key, now),
        UiMode::Normal => handle_plan_mode(app, key, now),
        UiMode::AddingTask | UiMode::AddingSubtask | UiMode::EditingTitle | UiMode::EditingMinutes => {
            handle_input_form_mode(app, key, now);
            false
        }
    }
}

/// Handle keys while planning the sprint
fn handle_plan_mode(app: &mut AppState, key: KeyEvent, now: EpochMs) -> bool {
    match key.code {
        // Navigation (with Shift modifier for reordering)
        KeyCode::Up => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.move_item_up(now);
            } else {
                app.move_selection_up();
            }
        }
        KeyCode::Down => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.move_item_down(now);
            } else {
                app.move_selection_down();
            }
        }
        KeyCode::Char('k') => app.move_selection_up(),
        KeyCode::Char('j') => app.move_selection_down(),

        KeyCode::Char('a') => app.start_add_task(),
        KeyCode::Char('A') => app.start_add_subtask(),
        KeyCode::Char('e') => app.start_edit_title(),
        KeyCode::Char('m') => app.start_edit_minutes(),

        // Adjust estimate
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_selected_minutes(MINUTES_STEP, now),
        KeyCode::Char('-') | KeyCode::Char('_') => app.adjust_selected_minutes(-MINUTES_STEP, now),

        KeyCode::Char(' ') => app.toggle_done_selected(now),
        KeyCode::Char('l') => app.toggle_later_selected(now),
        KeyCode::Char('y') => app.duplicate_selected(now),
        KeyCode::Char('x') | KeyCode::Delete => app.delete_selected(now),

        // Breaks go to the end of the sprint
        KeyCode::Char('b') => app.insert_break(5, now),
        KeyCode::Char('B') => app.insert_break(10, now),

        KeyCode::Char('t') => app.trim_to_fit(now),
        KeyCode::Char('c') => app.cycle_cutoff(now),
        KeyCode::Char('s') | KeyCode::Enter => app.start_sprint(now),

        KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        _ => {}
    }
    false
}

/// Handle keys while the sprint is running
fn handle_run_mode(app: &mut AppState, key: KeyEvent, now: EpochMs) -> bool {
    match key.code {
        KeyCode::Char('d') => app.done_active(now),
        KeyCode::Char('p') | KeyCode::Char(' ') => app.toggle_pause(now),
        KeyCode::Char('n') | KeyCode::Enter => app.start_next(now),

        // More or less time for the active task
        KeyCode::Char('5') => app.extend_active(5, now),
        KeyCode::Char('0') => app.extend_active(10, now),
        KeyCode::Char('r') => app.reduce_active(5, now),

        // Breaks run next
        KeyCode::Char('b') => app.insert_break(5, now),
        KeyCode::Char('B') => app.insert_break(10, now),

        KeyCode::Char('S') => app.stop_after_this_task(now),
        KeyCode::Char('x') => app.delete_active(now),
        KeyCode::Esc => app.exit_to_plan(now),

        KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        _ => {}
    }
    false
}

/// Handle keys in input form mode (adding or editing)
fn handle_input_form_mode(app: &mut AppState, key: KeyEvent, now: EpochMs) {
    match key.code {
        KeyCode::Enter => app.submit_input_form(now),
        KeyCode::Esc => app.cancel_input_form(),
        KeyCode::Tab => app.input_form_toggle_field(),
        KeyCode::Backspace => app.input_form_backspace(),
        KeyCode::Char(c) => app.input_form_add_char(c),
        _ => {}
    }
}
