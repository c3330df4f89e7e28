use crate::app::AppState;
use crate::domain::{Bucket, Task, TaskStatus};
use crate::sprint::format::{format_clock, format_total_minutes};
use crate::ui::styles::{border_style, default_style, title_style};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn field(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![Span::styled(label, title_style()), Span::raw(value)])
}

fn details_lines(app: &AppState, task: &Task) -> Vec<Line<'static>> {
    let store = app.session.store();
    let mut lines = vec![field("Title:    ", task.title.clone()), Line::raw("")];

    let kind = if task.is_break() { "break" } else { "task" };
    lines.push(field("Kind:     ", kind.to_string()));
    lines.push(field("Status:   ", task.status.to_tag().to_string()));
    if task.is_top_level() {
        let bucket = match Bucket::of(task) {
            Bucket::Active => "running now",
            Bucket::Sprint => "in sprint",
            Bucket::Later => "later",
            Bucket::Done => "done",
        };
        lines.push(field("Plan:     ", bucket.to_string()));
    }

    lines.push(field("Estimate: ", format_total_minutes(task.estimate_minutes)));
    if task.extra_minutes > 0 {
        lines.push(field("Extra:    ", format_total_minutes(task.extra_minutes)));
    }

    if let Some(parent) = task.parent_id.as_deref().and_then(|id| store.get(id)) {
        lines.push(field("Parent:   ", parent.title.clone()));
    }

    let children: Vec<&Task> = store.children(&task.id).collect();
    if !children.is_empty() {
        let done = children.iter().filter(|c| c.status == TaskStatus::Done).count();
        let minutes: u32 = children.iter().map(|c| c.total_minutes()).sum();
        lines.push(field(
            "Steps:    ",
            format!("{}/{} done, {}", done, children.len(), format_total_minutes(minutes)),
        ));
    }

    lines.push(field("Added:    ", format_clock(task.created_at)));
    lines
}

/// Render the details pane for the selected task
pub fn render_details_pane(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(" Details ", title_style()));

    let Some(task) = app.selected_task() else {
        let empty = Paragraph::new("No task selected. Press a to add one.")
            .style(default_style())
            .block(block);
        f.render_widget(empty, area);
        return;
    };

    let paragraph = Paragraph::new(details_lines(app, task))
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::state::MemoryStorage;
    use crate::sprint::testing::{child, leaf, session};

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_parent_details_summarize_steps() {
        let mut done = child("c1", "p", 10.0);
        done.status = TaskStatus::Done;
        let app = AppState::new(
            session(vec![leaf("p", 5.0), done, child("c2", "p", 60.0)]),
            Box::new(MemoryStorage::default()),
        );
        let task = app.session.store().get("p").unwrap();
        let lines: Vec<String> = details_lines(&app, task).iter().map(text).collect();

        assert!(lines.contains(&"Plan:     in sprint".to_string()));
        assert!(lines.contains(&"Steps:    1/2 done, 1h 10m".to_string()));
    }

    #[test]
    fn test_subtask_details_name_parent() {
        let app = AppState::new(
            session(vec![leaf("p", 5.0), child("c1", "p", 10.0)]),
            Box::new(MemoryStorage::default()),
        );
        let task = app.session.store().get("c1").unwrap();
        let lines: Vec<String> = details_lines(&app, task).iter().map(text).collect();

        assert!(lines.contains(&"Parent:   p".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("Plan:")));
    }
}
