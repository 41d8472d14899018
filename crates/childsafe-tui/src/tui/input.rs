// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the app
// orchestrator, or into local ViewState mutations (editing the input line,
// scrolling, quit confirmation).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use childsafe_core::protocol::UserCommand;

use super::ViewState;

/// Rows moved by PageUp/PageDown.
const PAGE_SIZE: usize = 10;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);

    // Ctrl+C always quits immediately regardless of mode
    if ctrl && key_event.code == KeyCode::Char('c') {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    view_state.notice = None;

    if ctrl {
        return match key_event.code {
            KeyCode::Char('l') => Some(UserCommand::ClearConversation),
            KeyCode::Char('r') => Some(UserCommand::CheckHealth),
            KeyCode::Char('u') => {
                view_state.input.clear();
                None
            }
            _ => None,
        };
    }

    match key_event.code {
        KeyCode::Enter => submit_input(view_state),

        KeyCode::F(n) => {
            let index = usize::from(n).checked_sub(1)?;
            if index < view_state.examples.len() {
                view_state.scroll_back = 0;
                Some(UserCommand::SubmitExample(index))
            } else {
                None
            }
        }

        // Esc: clear the input line, or ask to quit when it is already empty
        KeyCode::Esc => {
            if view_state.input.is_empty() {
                view_state.confirm_quit = true;
            } else {
                view_state.input.clear();
            }
            None
        }

        KeyCode::Backspace => {
            view_state.input.pop();
            None
        }

        KeyCode::Char(c) if !key_event.modifiers.contains(KeyModifiers::ALT) => {
            view_state.input.push(c);
            None
        }

        KeyCode::Up => {
            scroll_up(view_state, 1);
            None
        }
        KeyCode::Down => {
            scroll_down(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            scroll_up(view_state, PAGE_SIZE);
            None
        }
        KeyCode::PageDown => {
            scroll_down(view_state, PAGE_SIZE);
            None
        }
        KeyCode::Home => {
            view_state.scroll_back = view_state.max_scroll.get();
            None
        }
        KeyCode::End => {
            view_state.scroll_back = 0;
            None
        }

        _ => None,
    }
}

/// Take the input line as a query.
///
/// Blank input is ignored. While an answer is pending the text stays in the
/// input box so it can be sent once the answer arrives.
fn submit_input(view_state: &mut ViewState) -> Option<UserCommand> {
    if view_state.input.trim().is_empty() {
        view_state.input.clear();
        return None;
    }
    if view_state.pending {
        view_state.notice = Some("Still waiting for the previous answer".into());
        return None;
    }
    view_state.scroll_back = 0;
    Some(UserCommand::Submit(std::mem::take(&mut view_state.input)))
}

/// Handle key events while in quit confirmation mode.
///
/// - `y` or `q` confirms quit
/// - `n` or `Esc` cancels
/// - All other keys are blocked
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

fn scroll_up(view_state: &mut ViewState, lines: usize) {
    let max = view_state.max_scroll.get();
    view_state.scroll_back = view_state.scroll_back.saturating_add(lines).min(max);
}

fn scroll_down(view_state: &mut ViewState, lines: usize) {
    view_state.scroll_back = view_state.scroll_back.saturating_sub(lines);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
