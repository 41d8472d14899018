// Example prompt list, shown in the conversation until the first question.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Lines listing the example prompts with their function keys.
pub fn lines(examples: &[String]) -> Vec<Line<'static>> {
    if examples.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![Line::from(Span::styled(
        "Try asking:",
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))];
    lines.extend(examples.iter().enumerate().map(|(i, prompt)| {
        Line::from(vec![
            Span::styled(
                format!("  F{:<2} ", i + 1),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(prompt.clone()),
        ])
    }));
    lines
}
