// Terminal chat interface: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors the conversation held by the app
// orchestrator. The orchestrator pushes `UiUpdate` messages over an mpsc
// channel; the TUI applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod markdown;
pub mod widgets;

use std::cell::Cell;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use childsafe_core::config::UiConfig;
use childsafe_core::message::{Message, Role};
use childsafe_core::protocol::{BackendStatus, UiUpdate, UserCommand};

use layout::build_layout;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
#[derive(Debug, Default)]
pub struct ViewState {
    /// Shown at the left of the status bar.
    pub title: String,
    /// Conversation in chronological order.
    pub messages: Vec<Message>,
    /// Example prompts, bound to F1..F9.
    pub examples: Vec<String>,
    /// Text being composed in the input box.
    pub input: String,
    /// Whether a query is waiting for its answer.
    pub pending: bool,
    pub backend_status: BackendStatus,
    /// One-line notice shown in the status bar until the next keystroke.
    pub notice: Option<String>,
    /// Rows scrolled back from the bottom of the conversation; 0 follows
    /// the newest message.
    pub scroll_back: usize,
    /// Largest useful `scroll_back`, recorded by the last render.
    pub max_scroll: Cell<usize>,
    pub confirm_quit: bool,
}

impl ViewState {
    pub fn from_config(ui: &UiConfig) -> Self {
        ViewState {
            title: ui.title.clone(),
            examples: ui.examples.clone(),
            ..Default::default()
        }
    }

    /// Whether the user has asked anything yet in this conversation.
    pub fn has_user_messages(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::User)
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::MessageAppended(message) => {
            state.messages.push(*message);
            state.scroll_back = 0;
        }
        UiUpdate::Pending(pending) => {
            state.pending = pending;
        }
        UiUpdate::Cleared => {
            state.messages.clear();
            state.scroll_back = 0;
            state.notice = None;
        }
        UiUpdate::BackendStatus(status) => {
            state.backend_status = status;
        }
        UiUpdate::Notice(text) => {
            state.notice = Some(text);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete chat screen.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::conversation::render(frame, layout.conversation, state);
    widgets::input_box::render(frame, layout.input, state);
    widgets::help_bar::render(frame, layout.help_bar, state);

    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    mut view_state: ViewState,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: anyhow::Result<()> = loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => {
                        debug!("UI channel closed");
                        break Ok(());
                    }
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            if cmd_tx.send(cmd).await.is_err() || quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Resize and mouse events: the next tick redraws.
                    }
                    Some(Err(e)) => {
                        warn!("Terminal input error: {}", e);
                        break Err(e.into());
                    }
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                if let Err(e) = terminal.draw(|frame| render_frame(frame, &view_state)) {
                    break Err(e.into());
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn state() -> ViewState {
        ViewState::from_config(&UiConfig {
            title: "ChildSafe Assistant".into(),
            greeting: None,
            examples: vec!["Who is ChildSafe?".into()],
        })
    }

    #[test]
    fn view_state_default_is_sensible() {
        let state = ViewState::default();
        assert!(state.messages.is_empty());
        assert!(state.input.is_empty());
        assert!(!state.pending);
        assert_eq!(state.backend_status, BackendStatus::Unknown);
        assert!(state.notice.is_none());
        assert_eq!(state.scroll_back, 0);
        assert!(!state.confirm_quit);
    }

    #[test]
    fn from_config_copies_title_and_examples() {
        let state = state();
        assert_eq!(state.title, "ChildSafe Assistant");
        assert_eq!(state.examples, vec!["Who is ChildSafe?".to_string()]);
    }

    #[test]
    fn message_appended_follows_tail() {
        let mut state = state();
        state.scroll_back = 12;
        apply_ui_update(
            &mut state,
            UiUpdate::MessageAppended(Box::new(Message::user("hello"))),
        );
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.scroll_back, 0);
        assert!(state.has_user_messages());
    }

    #[test]
    fn pending_and_status_updates() {
        let mut state = state();
        apply_ui_update(&mut state, UiUpdate::Pending(true));
        assert!(state.pending);
        apply_ui_update(&mut state, UiUpdate::BackendStatus(BackendStatus::Online));
        assert_eq!(state.backend_status, BackendStatus::Online);
        apply_ui_update(&mut state, UiUpdate::Pending(false));
        assert!(!state.pending);
    }

    #[test]
    fn cleared_drops_messages_and_notice() {
        let mut state = state();
        apply_ui_update(
            &mut state,
            UiUpdate::MessageAppended(Box::new(Message::user("hello"))),
        );
        apply_ui_update(&mut state, UiUpdate::Notice("busy".into()));
        apply_ui_update(&mut state, UiUpdate::Cleared);
        assert!(state.messages.is_empty());
        assert!(state.notice.is_none());
        assert!(!state.has_user_messages());
    }

    #[test]
    fn render_frame_shows_examples_before_first_question() {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        let state = state();
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("ChildSafe Assistant"));
        assert!(text.contains("F1"));
        assert!(text.contains("Who is ChildSafe?"));
    }

    #[test]
    fn render_frame_shows_conversation() {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        let mut state = state();
        apply_ui_update(
            &mut state,
            UiUpdate::MessageAppended(Box::new(Message::user("What is ChildSafe?"))),
        );
        apply_ui_update(
            &mut state,
            UiUpdate::MessageAppended(Box::new(Message::bot("A **child safety** NGO."))),
        );
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("What is ChildSafe?"));
        assert!(text.contains("A child safety NGO."));
        assert!(!text.contains("F1 "));
    }

    #[test]
    fn render_frame_with_quit_confirm() {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        let mut state = state();
        state.confirm_quit = true;
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();
        assert!(screen_text(&terminal).contains("Really quit?"));
    }

    #[test]
    fn render_frame_in_tiny_terminal_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(10, 4)).unwrap();
        let mut state = state();
        state.confirm_quit = true;
        state.input = "a long question that does not fit".into();
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();
    }
}
