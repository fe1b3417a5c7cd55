use crate::ui::styles::hint_style;
use ratatui::{layout::Rect, text::{Line, Span}, widgets::Paragraph, Frame};

/// Render the keybindings hint bar
pub fn render_keybindings(f: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::raw(" ↑/↓ select   "),
        Span::raw("Tab pane   "),
        Span::raw("Enter start/stop   "),
        Span::raw("s stop   "),
        Span::raw("c complete   "),
        Span::raw("p project   "),
        Span::raw("a task   "),
        Span::raw("r rename   "),
        Span::raw("e expected   "),
        Span::raw("+/- priority   "),
        Span::raw("d delete   "),
        Span::raw("f/1-4 filter   "),
        Span::raw("q quit"),
    ]);

    let paragraph = Paragraph::new(hints).style(hint_style());
    f.render_widget(paragraph, area);
}
