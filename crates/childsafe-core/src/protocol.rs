// Messages exchanged between the TUI and the app orchestrator.

use crate::message::Message;

/// Reachability of the RAG backend as last observed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Unknown,
    Online,
    Offline(String),
}

/// Commands sent from the TUI to the app orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Send the typed input as a query.
    Submit(String),
    /// Send the configured example prompt at this index.
    SubmitExample(usize),
    ClearConversation,
    CheckHealth,
    Quit,
}

/// Updates pushed from the app orchestrator to the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// A message was appended to the conversation.
    MessageAppended(Box<Message>),
    /// Whether a query is waiting for its answer.
    Pending(bool),
    /// The conversation was reset (the greeting, if any, follows as a
    /// `MessageAppended`).
    Cleared,
    BackendStatus(BackendStatus),
    /// Transient one-line notice for the status bar.
    Notice(String),
}
