use crate::app::AppState;
use crate::domain::{format_hms, StatsFilter};
use crate::ui::styles::{border_style, muted_style, selected_style, title_style};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

/// Render totals and the filtered window, with the filter as tabs
pub fn render_stats_pane(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(Span::styled(" Statistics ", title_style()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let filter = app.stats.filter();
    let tabs = Tabs::new(StatsFilter::all().iter().map(|f| f.label()).collect::<Vec<_>>())
        .select(filter.index())
        .style(muted_style())
        .highlight_style(selected_style())
        .divider("|");
    f.render_widget(tabs, chunks[0]);

    let summary = app.stats_summary();
    let label = |text: &str| Span::styled(text.to_string(), title_style());
    let lines = vec![
        Line::from(vec![
            label("Total time: "),
            Span::raw(format_hms(summary.total_time_spent)),
            Span::styled(
                format!(
                    "   {} done / {} tasks ({})",
                    summary.completed_count,
                    summary.completed_count + summary.active_count,
                    summary.completion_rate
                ),
                muted_style(),
            ),
        ]),
        Line::raw(""),
        Line::from(vec![
            label(&format!("{}: ", filter.label())),
            Span::raw(format!("{} completed", summary.filtered_completed_count)),
        ]),
        Line::from(vec![
            label("Time on completed: "),
            Span::raw(format_hms(summary.filtered_time_spent)),
        ]),
        Line::from(vec![
            label("Completion rate: "),
            Span::raw(summary.filtered_completion_rate.to_string()),
        ]),
    ];
    f.render_widget(Paragraph::new(lines), chunks[1]);
}
