pub mod input_form;
pub mod keybindings;
pub mod layout;
pub mod project_pane;
pub mod stats_pane;
pub mod styles;
pub mod task_pane;
pub mod timer_pane;

use crate::app::AppState;
use input_form::render_input_form;
use keybindings::render_keybindings;
use layout::create_layout;
use project_pane::render_project_pane;
use ratatui::{text::Line, widgets::Paragraph, Frame};
use stats_pane::render_stats_pane;
use styles::{error_style, hint_style};
use task_pane::render_task_pane;
use timer_pane::render_timer_pane;

/// Main render function - draws the entire UI
pub fn render(f: &mut Frame, app: &AppState) {
    let size = f.size();
    let layout = create_layout(size);

    render_keybindings(f, layout.keybindings_area);

    render_project_pane(f, app, layout.projects_area);
    render_task_pane(f, app, layout.tasks_area);
    render_timer_pane(f, app, layout.timer_area);
    render_stats_pane(f, app, layout.stats_area);

    // Status line: save failures take precedence over command feedback
    let status = match (app.save_error(), &app.status) {
        (Some(err), _) => Line::styled(format!(" Save failed: {}", err), error_style()),
        (None, Some(message)) if app.input_form.is_none() => {
            Line::styled(format!(" {}", message), error_style())
        }
        _ => Line::styled(format!(" {}", app.snapshot.user_id), hint_style()),
    };
    f.render_widget(Paragraph::new(status), layout.status_area);

    if app.input_form.is_some() {
        render_input_form(f, app, size);
    }
}
