use crate::app::AppState;
use crate::domain::{format_hms, Focus, Project};
use crate::ui::styles::{
    border_style, default_style, focused_border_style, muted_style, running_style, selected_style,
    selected_unfocused_style, title_style,
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

fn project_line(project: &Project, timing: bool) -> Line<'static> {
    let marker = if timing { "▶ " } else { "  " };
    Line::from(vec![
        Span::styled(marker.to_string(), running_style()),
        Span::styled(project.name.clone(), default_style()),
        Span::raw("  "),
        Span::styled(
            format!(
                "{} spent · {} est · {}/{}",
                format_hms(project.time_spent),
                format_hms(project.estimated_duration()),
                project.completed_tasks().len(),
                project.active_tasks().len() + project.completed_tasks().len()
            ),
            muted_style(),
        ),
    ])
}

/// Render the project list
pub fn render_project_pane(f: &mut Frame, app: &AppState, area: Rect) {
    let focused = app.focus == Focus::Projects;
    let timing_project = app
        .engine
        .session()
        .filter(|s| s.running)
        .map(|s| s.project_id);

    let items: Vec<ListItem> = app
        .snapshot
        .projects
        .iter()
        .enumerate()
        .map(|(idx, project)| {
            let line = project_line(project, timing_project == Some(project.id));
            let item = ListItem::new(line);
            if idx == app.selected_project {
                item.style(if focused { selected_style() } else { selected_unfocused_style() })
            } else {
                item
            }
        })
        .collect();

    let title = format!(" Projects ({}) ", app.snapshot.projects.len());
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(if focused { focused_border_style() } else { border_style() })
            .title(Span::styled(title, title_style())),
    );

    f.render_widget(list, area);
}
