use crate::app::AppState;
use crate::domain::{format_hms, TimerState};
use crate::ui::styles::{
    border_style, expired_style, gauge_style, muted_style, running_style, title_style,
};
use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

/// Render the countdown, progress gauge and daily counter
pub fn render_timer_pane(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(
            format!(" Timer · {} ", app.engine.state().to_tag()),
            title_style(),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Task
            Constraint::Length(1), // Countdown
            Constraint::Length(1), // Gauge
            Constraint::Min(0),    // Daily counter
        ])
        .split(inner);

    let Some(session) = app.engine.session() else {
        f.render_widget(
            Paragraph::new(Line::styled("No timer running. Select a task and press Enter.", muted_style())),
            chunks[0],
        );
        render_daily(f, app, chunks[3]);
        return;
    };

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(session.task_name.clone(), running_style()),
            Span::styled(format!("  in {}", session.project_name), muted_style()),
        ])),
        chunks[0],
    );

    let countdown_style = match app.engine.state() {
        TimerState::Expired => expired_style(),
        TimerState::Running => running_style(),
        _ => muted_style(),
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(session.countdown.clone(), countdown_style),
            Span::styled(format!("  of {}", format_hms(session.total)), muted_style()),
        ])),
        chunks[1],
    );

    let percent = session.progress.round().clamp(0.0, 100.0) as u16;
    let gauge = Gauge::default()
        .block(Block::default())
        .gauge_style(gauge_style())
        .percent(percent)
        .label(format!("{}%", percent));
    f.render_widget(gauge, chunks[2]);

    render_daily(f, app, chunks[3]);
}

fn render_daily(f: &mut Frame, app: &AppState, area: Rect) {
    let today = app.snapshot.daily_total_on(Utc::now().date_naive());
    let line = Line::from(vec![
        Span::styled("Tracked today: ", title_style()),
        Span::raw(format_hms(today)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
