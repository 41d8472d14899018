// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Conversation (fill)                               |
// |                                                   |
// +--------------------------------------------------+
// | Input Box (3 rows)                                |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Height of the bordered input box: one text row plus borders.
pub const INPUT_HEIGHT: u16 = 3;

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: title, backend status, pending indicator, notices.
    pub status_bar: Rect,
    /// Message history.
    pub conversation: Rect,
    /// Text being composed.
    pub input: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),            // status bar
            Constraint::Min(3),               // conversation
            Constraint::Length(INPUT_HEIGHT), // input box
            Constraint::Length(1),            // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        conversation: vertical[1],
        input: vertical[2],
        help_bar: vertical[3],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
