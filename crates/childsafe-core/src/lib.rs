// Shared types for the ChildSafe assistant client: the backend's wire
// format, chat messages, answer formatting, configuration, and the messages
// exchanged between the app loop and the UI.

pub mod config;
pub mod format;
pub mod message;
pub mod protocol;
pub mod wire;
