// Command-line interface: argument parsing and the one-shot subcommands.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use childsafe_app::session::ChatSession;
use childsafe_backend::QueryBackend;
use childsafe_core::config::API_URL_ENV;
use childsafe_core::message::Message;

#[derive(Debug, Parser)]
#[command(
    name = "childsafe-chat",
    version,
    about = "Chat with the ChildSafe South Africa assistant"
)]
pub struct Cli {
    /// Directory holding config/ and defaults/.
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Query endpoint of the assistant backend, overriding the config file.
    #[arg(long, value_name = "URL", env = API_URL_ENV)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Ask a single question and print the answer.
    Ask {
        query: String,
        /// Print the answer as HTML instead of markdown.
        #[arg(long)]
        html: bool,
    },
    /// Check that the backend is reachable.
    Health,
}

/// Send one query and build the resulting bot message.
///
/// Request failures become an error message rather than an `Err`, the same
/// way the interactive chat shows them.
pub async fn ask(
    backend: &dyn QueryBackend,
    query: &str,
    top_k: Option<u32>,
) -> anyhow::Result<Message> {
    let mut session = ChatSession::new(None, Vec::new());
    let pending = session
        .begin_query(query)
        .context("cannot send an empty question")?;

    info!("Sending one-shot query: {:?}", pending.query);
    let outcome = backend
        .query(&pending.request(top_k))
        .await
        .map_err(|e| e.to_string());
    session
        .complete(pending.id, outcome)
        .cloned()
        .context("query outcome was not recorded")
}

/// Text printed for an answer: its markdown source, or the rendered HTML.
pub fn render_answer(message: &Message, html: bool) -> &str {
    if html {
        &message.content
    } else {
        &message.source
    }
}

/// Check the health endpoint, returning the reported status.
pub async fn health(backend: &dyn QueryBackend) -> anyhow::Result<String> {
    backend
        .health()
        .await
        .context("backend health check failed")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
