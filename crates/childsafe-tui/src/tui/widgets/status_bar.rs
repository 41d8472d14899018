// Status bar widget: title, backend reachability, pending indicator, notice.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use childsafe_core::protocol::BackendStatus;

use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [title] [backend indicator] [pending] [notice]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![Span::styled(
        format!(" {} ", state.title),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));
    let (dot, label, color) = backend_indicator(&state.backend_status);
    spans.push(Span::styled(format!("{dot} "), Style::default().fg(color)));
    spans.push(Span::styled(label, Style::default().fg(Color::White)));

    if state.pending {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            "waiting for answer...",
            Style::default().fg(Color::Yellow),
        ));
    }

    if let Some(notice) = &state.notice {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            notice.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Return the indicator dot, label, and color for the backend status.
pub fn backend_indicator(status: &BackendStatus) -> (&'static str, String, Color) {
    match status {
        BackendStatus::Unknown => ("●", "checking backend...".to_string(), Color::DarkGray),
        BackendStatus::Online => ("●", "backend online".to_string(), Color::Green),
        BackendStatus::Offline(reason) => ("●", format!("backend offline: {reason}"), Color::Red),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
