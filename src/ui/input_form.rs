use crate::app::AppState;
use crate::domain::UiMode;
use crate::ui::{
    layout::create_modal_area,
    styles::{error_style, modal_bg_style, modal_title_style},
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn field_lines<'a>(label: &'a str, value: &'a str, editing: bool) -> [Line<'a>; 2] {
    let label = if editing {
        format!("{} (editing)", label)
    } else {
        label.to_string()
    };
    [
        Line::raw(label),
        Line::from(vec![
            Span::raw("> "),
            Span::styled(value, modal_title_style()),
            if editing {
                Span::styled("█", modal_title_style()) // Cursor
            } else {
                Span::raw("")
            },
        ]),
    ]
}

/// Render the add/rename/edit form
pub fn render_input_form(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(form) = &app.input_form else {
        return;
    };
    let modal_area = create_modal_area(area);

    // Clear the area behind the form
    f.render_widget(Clear, modal_area);

    let (title, show_name, show_expected) = match app.ui_mode {
        UiMode::AddingProject => (" Add Project ", true, false),
        UiMode::AddingTask => (" Add Task ", true, true),
        UiMode::RenamingProject => (" Rename Project ", true, false),
        UiMode::RenamingTask => (" Rename Task ", true, false),
        UiMode::EditingExpected => (" Expected Time ", false, true),
        UiMode::Normal => return,
    };

    let mut lines = vec![Line::raw("")];
    if show_name {
        lines.extend(field_lines("Name:", &form.name, form.editing_field == 0));
        lines.push(Line::raw(""));
    }
    if show_expected {
        lines.extend(field_lines("Expected (HH:MM:SS):", &form.expected, form.editing_field == 1));
        lines.push(Line::raw(""));
    }

    let hint = if app.ui_mode == UiMode::AddingTask {
        "Tab to switch fields  ·  Enter to submit  ·  Esc to cancel"
    } else {
        "Enter to submit  ·  Esc to cancel"
    };
    lines.push(Line::raw(hint));

    if let Some(status) = &app.status {
        lines.push(Line::styled(status.clone(), error_style()));
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(title, modal_title_style()))
                .style(modal_bg_style()),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, modal_area);
}
