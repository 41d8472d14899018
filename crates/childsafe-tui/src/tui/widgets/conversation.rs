// Conversation widget: the message history, newest at the bottom.
//
// Each message gets a header line (author, answer mode, time) followed by its
// markdown body. While no question has been asked the example prompts are
// listed under the history. The view sticks to the newest message unless the
// user has scrolled back.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use childsafe_core::message::{Message, Role};

use super::examples;
use crate::tui::markdown;
use crate::tui::ViewState;

/// Render the conversation panel into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for message in &state.messages {
        lines.extend(message_lines(message));
        lines.push(Line::default());
    }
    if state.pending {
        lines.push(Line::from(Span::styled(
            "Assistant is thinking...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    if !state.has_user_messages() {
        lines.extend(examples::lines(&state.examples));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Conversation"))
        .wrap(Wrap { trim: false });

    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2);
    let total = paragraph.line_count(inner_width).saturating_sub(2);
    let max_scroll = total.saturating_sub(inner_height);
    state.max_scroll.set(max_scroll);

    let top = max_scroll - state.scroll_back.min(max_scroll);
    let paragraph = paragraph.scroll((u16::try_from(top).unwrap_or(u16::MAX), 0));
    frame.render_widget(paragraph, area);
}

/// Header and body lines for one message.
pub fn message_lines(message: &Message) -> Vec<Line<'static>> {
    let (author, author_color) = match (message.role, message.is_error) {
        (Role::User, _) => ("You", Color::Cyan),
        (Role::Bot, false) => ("Assistant", Color::Green),
        (Role::Bot, true) => ("Assistant", Color::Red),
    };

    let mut header = vec![Span::styled(
        author,
        Style::default()
            .fg(author_color)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(mode) = message.mode {
        header.push(Span::styled(
            format!(" [{}]", mode.label()),
            Style::default().fg(Color::Magenta),
        ));
    }
    header.push(Span::styled(
        format!(" {}", message.sent_at.format("%H:%M")),
        Style::default().fg(Color::DarkGray),
    ));

    let mut lines = vec![Line::from(header)];
    if let Some(rewritten) = &message.rewritten {
        lines.push(Line::from(Span::styled(
            format!("searched for: {rewritten}"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let body_style = if message.is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    match message.role {
        // Questions are shown as typed.
        Role::User => lines.extend(
            message
                .source
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), body_style))),
        ),
        Role::Bot => lines.extend(markdown::to_lines(&message.source, body_style)),
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
