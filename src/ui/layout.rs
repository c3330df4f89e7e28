use crate::ui::keybindings::HINT_ROWS;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Main layout structure
pub struct MainLayout {
    pub keybindings_area: Rect,
    pub header_area: Rect,
    /// Plan list, or the run panel while a sprint runs
    pub main_area: Rect,
    /// Task details in plan mode, the sprint queue in run mode
    pub side_area: Rect,
    pub toast_area: Rect,
}

/// Create the main layout
/// - Top bar: keybindings (2 rows)
/// - Header: clock, projection and cutoff (4 rows)
/// - Main area: Main (65%) | Side (35%)
/// - Footer: toast (1 row)
pub fn create_layout(area: Rect) -> MainLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HINT_ROWS), // Keybindings bar
            Constraint::Length(4), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Toast
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[2]);

    MainLayout {
        keybindings_area: rows[0],
        header_area: rows[1],
        main_area: columns[0],
        side_area: columns[1],
        toast_area: rows[3],
    }
}

/// Create a centered modal area of the given height
pub fn create_modal_area(area: Rect, height: u16) -> Rect {
    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Length(height),
            Constraint::Percentage(25),
        ])
        .split(area);

    let horizontal_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(vertical_chunks[1]);

    horizontal_chunks[1]
}
