// Library root for the chat client binary: exposes the CLI and TUI modules
// so integration tests can drive them.

pub mod cli;
pub mod tui;
