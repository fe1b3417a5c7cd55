use crate::app::AppState;
use crate::domain::{format_hms, Focus, Task};
use crate::ui::styles::{
    border_style, default_style, done_style, focused_border_style, muted_style, running_style,
    selected_style, selected_unfocused_style, title_style,
};
use chrono::Local;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Line for an active task
fn active_line(task: &Task, running: bool) -> Line<'static> {
    let badge = if running {
        Span::styled("▶ ".to_string(), running_style())
    } else {
        Span::raw("○ ".to_string())
    };

    let mut spans = vec![
        badge,
        Span::styled(task.name.clone(), default_style()),
        Span::raw("  "),
        Span::styled(
            format!(
                "({} / {}, {} left)",
                format_hms(task.elapsed_duration),
                format_hms(task.expected_duration),
                format_hms(task.budget())
            ),
            muted_style(),
        ),
    ];
    if task.priority != 0 {
        spans.push(Span::styled(format!("  p{}", task.priority), muted_style()));
    }
    Line::from(spans)
}

/// Line for a completed task, with its local completion time
fn completed_line(task: &Task) -> Line<'static> {
    let when = task
        .completed_at()
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();

    Line::from(vec![
        Span::styled("✓ ".to_string(), done_style()),
        Span::styled(task.name.clone(), default_style()),
        Span::raw("  "),
        Span::styled(
            format!("({} / {})  {}", format_hms(task.elapsed_duration), format_hms(task.expected_duration), when),
            done_style(),
        ),
    ])
}

/// Render active then completed tasks of the selected project
pub fn render_task_pane(f: &mut Frame, app: &AppState, area: Rect) {
    let focused = app.focus == Focus::Tasks;
    let running = app.engine.running_task();

    let items: Vec<ListItem> = app
        .visible_tasks()
        .into_iter()
        .enumerate()
        .map(|(idx, task)| {
            let line = if task.is_completed() {
                completed_line(task)
            } else {
                active_line(task, running == Some(task.id))
            };
            let item = ListItem::new(line);
            if focused && idx == app.selected_task {
                item.style(selected_style())
            } else if idx == app.selected_task {
                item.style(selected_unfocused_style())
            } else {
                item
            }
        })
        .collect();

    let title = match app.snapshot.projects.get(app.selected_project) {
        Some(project) => format!(
            " {} · {} active · {} done ",
            project.name,
            project.active_tasks().len(),
            project.completed_tasks().len()
        ),
        None => " Tasks (add a project with p) ".to_string(),
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(if focused { focused_border_style() } else { border_style() })
            .title(Span::styled(title, title_style())),
    );

    f.render_widget(list, area);
}
