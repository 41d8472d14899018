// Help bar widget: keyboard shortcut hints.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        hint_text(state),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn hint_text(state: &ViewState) -> String {
    let mut hints = vec!["Enter:Send"];
    match state.examples.len() {
        0 => {}
        1 => hints.push("F1:Example"),
        _ => hints.push("F1-F9:Examples"),
    }
    hints.extend([
        "↑↓/PgUp/PgDn:Scroll",
        "Ctrl+L:Clear",
        "Ctrl+R:Recheck",
        "Esc:Quit",
    ]);
    format!(" {}", hints.join(" | "))
}
