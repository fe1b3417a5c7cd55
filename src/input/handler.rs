use crate::app::AppState;
use crate::domain::{StatsFilter, UiMode};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Handle keyboard input events; returns true when the app should quit
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match app.ui_mode {
        UiMode::Normal => handle_normal_mode(app, key),
        UiMode::AddingProject
        | UiMode::AddingTask
        | UiMode::RenamingProject
        | UiMode::RenamingTask
        | UiMode::EditingExpected => handle_input_form_mode(app, key),
    }
}

/// Handle keys in normal mode
fn handle_normal_mode(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(true);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => app.move_selection_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection_down(),
        KeyCode::Tab | KeyCode::Left | KeyCode::Right => app.toggle_focus(),

        // Timer
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_timer_on_selected(),
        KeyCode::Char('s') => {
            app.stop_timer();
        }

        // Task state
        KeyCode::Char('c') => app.toggle_completion_on_selected(),
        KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
        KeyCode::Char('+') | KeyCode::Char('=') => bump_priority(app, 1),
        KeyCode::Char('-') => bump_priority(app, -1),

        // Forms
        KeyCode::Char('p') => app.start_add_project(),
        KeyCode::Char('a') => app.start_add_task(),
        KeyCode::Char('r') => app.start_rename(),
        KeyCode::Char('e') => app.start_edit_expected(),

        // Statistics filter
        KeyCode::Char('f') => app.cycle_filter(),
        KeyCode::Char(c @ '1'..='4') => {
            let idx = (c as usize) - ('1' as usize);
            if let Some(filter) = StatsFilter::all().get(idx) {
                app.set_filter(*filter);
            }
        }

        _ => {}
    }
    Ok(false)
}

fn bump_priority(app: &mut AppState, delta: i32) {
    if let Some(task) = app.selected_task() {
        let (id, priority) = (task.id, task.priority.saturating_add(delta));
        if let Err(e) = app.set_priority(id, priority) {
            app.status = Some(e.to_string());
        }
    }
}

/// Handle keys in input form mode (add, rename, edit expected)
fn handle_input_form_mode(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Enter => app.submit_input_form(),
        KeyCode::Esc => app.cancel_input_form(),

        // Switch between name and expected time
        KeyCode::Tab => app.input_form_toggle_field(),

        KeyCode::Backspace => app.input_form_backspace(),
        KeyCode::Char(c) => app.input_form_add_char(c),

        _ => {}
    }
    Ok(false)
}
