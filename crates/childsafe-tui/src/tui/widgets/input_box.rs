// Input box widget: the question being composed.

use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

/// Render the input box and place the terminal cursor after the text.
///
/// When the text is wider than the box only its tail is shown.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let (title, border) = if state.pending {
        (" Waiting for answer... ", Style::default().fg(Color::Yellow))
    } else {
        (" Ask a question (Enter to send) ", Style::default().fg(Color::Cyan))
    };

    let inner_width = area.width.saturating_sub(2) as usize;
    let visible = visible_tail(&state.input, inner_width.saturating_sub(1));

    let paragraph = Paragraph::new(visible.clone()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border),
    );
    frame.render_widget(paragraph, area);

    if !state.confirm_quit && area.width > 2 && area.height > 2 {
        let offset = u16::try_from(visible.chars().count()).unwrap_or(u16::MAX);
        frame.set_cursor_position(Position::new(
            (area.x + 1).saturating_add(offset).min(area.right().saturating_sub(2)),
            area.y + 1,
        ));
    }
}

/// The last `max` characters of `text`.
pub fn visible_tail(text: &str, max: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max)).collect()
}
