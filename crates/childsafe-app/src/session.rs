// Chat session: the ordered conversation and the one outstanding query.
//
// The session is plain synchronous state. The app loop calls `begin_query`
// when the user submits, sends the returned `PendingQuery` to the backend,
// and feeds the outcome back through `complete`.

use thiserror::Error;
use tracing::debug;

use childsafe_core::config::UiConfig;
use childsafe_core::message::Message;
use childsafe_core::wire::{QueryRequest, QueryResults};

/// A query accepted by the session and waiting for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub id: u64,
    pub query: String,
}

impl PendingQuery {
    /// The `/query` body for this question.
    pub fn request(&self, top_k: Option<u32>) -> QueryRequest {
        QueryRequest::new(self.query.as_str()).with_top_k(top_k)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("nothing to send")]
    Empty,
    #[error("still waiting for the previous answer")]
    Busy,
    #[error("no example prompt #{0}")]
    UnknownExample(usize),
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<Message>,
    pending: Option<u64>,
    next_id: u64,
    greeting: Option<String>,
    examples: Vec<String>,
}

impl ChatSession {
    /// Start a conversation, opening with `greeting` when one is given.
    pub fn new(greeting: Option<String>, examples: Vec<String>) -> Self {
        let greeting = greeting.filter(|g| !g.trim().is_empty());
        let mut session = ChatSession {
            messages: Vec::new(),
            pending: None,
            next_id: 1,
            greeting,
            examples,
        };
        session.push_greeting();
        session
    }

    pub fn from_config(ui: &UiConfig) -> Self {
        Self::new(ui.greeting.clone(), ui.examples.clone())
    }

    /// Messages in chronological order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn example(&self, index: usize) -> Option<&str> {
        self.examples.get(index).map(String::as_str)
    }

    /// Accept `input` as the next query and append it as a user message.
    pub fn begin_query(&mut self, input: &str) -> Result<PendingQuery, SubmitRejected> {
        let query = input.trim();
        if query.is_empty() {
            return Err(SubmitRejected::Empty);
        }
        if self.pending.is_some() {
            return Err(SubmitRejected::Busy);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.pending = Some(id);
        self.messages.push(Message::user(query));
        Ok(PendingQuery {
            id,
            query: query.to_string(),
        })
    }

    /// Submit the example prompt at `index`.
    pub fn begin_example(&mut self, index: usize) -> Result<PendingQuery, SubmitRejected> {
        let prompt = self
            .example(index)
            .ok_or(SubmitRejected::UnknownExample(index))?
            .to_string();
        self.begin_query(&prompt)
    }

    /// Record the outcome of query `id`: the backend's results, or a
    /// description of why the request failed.
    ///
    /// Returns the appended bot message, or `None` when `id` is not the
    /// outstanding query (e.g. the conversation was cleared meanwhile).
    pub fn complete(
        &mut self,
        id: u64,
        outcome: Result<QueryResults, String>,
    ) -> Option<&Message> {
        if self.pending != Some(id) {
            debug!(id, pending = ?self.pending, "discarding stale query outcome");
            return None;
        }
        self.pending = None;

        let message = match outcome {
            Ok(results) => Message::from_results(&results),
            Err(description) => Message::error(description),
        };
        self.messages.push(message);
        self.messages.last()
    }

    /// Forget the conversation. Returns the fresh greeting, if configured.
    pub fn clear(&mut self) -> Option<&Message> {
        self.messages.clear();
        self.pending = None;
        self.push_greeting();
        self.messages.last()
    }

    fn push_greeting(&mut self) {
        if let Some(greeting) = &self.greeting {
            self.messages.push(Message::bot(greeting.clone()));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
