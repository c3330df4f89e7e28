use crate::app::AppState;
use crate::domain::{status_badge, tree_connector, Bucket, FlatRow, Task, TaskStatus};
use crate::sprint::format::format_total_minutes;
use crate::ui::styles::{
    active_style, border_style, default_style, done_style, later_style, selected_style,
    sprint_style, title_style, tree_style,
};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

fn badge_style(task: &Task) -> Style {
    match Bucket::of(task) {
        Bucket::Active => active_style(),
        Bucket::Sprint => sprint_style(),
        Bucket::Later => later_style(),
        Bucket::Done => done_style(),
    }
}

/// Render the task list. The selection is only highlighted while planning.
pub fn render_list_pane(f: &mut Frame, app: &AppState, area: Rect, highlight: bool) {
    let tasks = app.session.tasks();
    let rows = app.rows();

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let line = create_task_line(&tasks[row.task_index], row);
            let style = if highlight && row.index == app.selected_index {
                selected_style()
            } else {
                default_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let title = format!(
        " Plan · {} in sprint ",
        format_total_minutes(app.session.planned_minutes())
    );
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style())
            .title(Span::styled(title, title_style())),
    );

    f.render_widget(list, area);
}

/// Create a single line for a task, break or subtask
/// Format: SPRINT  Write proposal  25m
fn create_task_line(task: &Task, row: &FlatRow) -> Line<'static> {
    let mut spans = Vec::new();

    if row.depth > 0 {
        spans.push(Span::styled("   ".to_string(), tree_style()));
        spans.push(Span::styled(tree_connector(row.is_last).to_string(), tree_style()));
        spans.push(Span::raw(" ".to_string()));
    }

    spans.push(Span::styled(format!("{:<6} ", status_badge(task)), badge_style(task)));

    let title = if task.is_break() {
        format!("☕ {}", task.title)
    } else {
        task.title.clone()
    };
    let text_style = if task.status == TaskStatus::Done {
        done_style()
    } else {
        default_style()
    };
    spans.push(Span::styled(title, text_style));
    spans.push(Span::raw("  ".to_string()));

    let minutes = if task.extra_minutes > 0 {
        format!("{}m +{}m", task.estimate_minutes, task.extra_minutes)
    } else {
        format!("{}m", task.estimate_minutes)
    };
    spans.push(Span::styled(minutes, tree_style()));

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flatten_tasks;
    use crate::sprint::testing::{brk, child, leaf};

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_create_task_line() {
        let tasks = vec![leaf("Write proposal", 25.0)];
        let rows = flatten_tasks(&tasks);
        let line = create_task_line(&tasks[0], &rows[0]);

        assert_eq!(text(&line), "SPRINT Write proposal  25m");
    }

    #[test]
    fn test_create_subtask_line() {
        let mut tasks = vec![leaf("p", 10.0), child("Outline", "p", 10.0)];
        tasks[1].extra_minutes = 5;
        let rows = flatten_tasks(&tasks);
        let line = create_task_line(&tasks[1], &rows[1]);

        assert_eq!(text(&line), "   └─ ·      Outline  10m +5m");
    }

    #[test]
    fn test_break_line() {
        let tasks = vec![brk("b1", 5)];
        let rows = flatten_tasks(&tasks);
        let line = create_task_line(&tasks[0], &rows[0]);

        assert!(text(&line).contains("☕ Break"));
    }
}
