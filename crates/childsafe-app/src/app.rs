// Application state and orchestration logic.
//
// The event loop owns the chat session. It receives user commands from the
// TUI and backend events from the request tasks it spawns, and pushes UI
// updates back to the TUI render loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use childsafe_backend::QueryBackend;
use childsafe_core::protocol::{BackendStatus, UiUpdate, UserCommand};
use childsafe_core::wire::QueryResults;

use crate::session::{ChatSession, PendingQuery, SubmitRejected};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Results of spawned backend tasks, delivered to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Answer {
        request_id: u64,
        results: QueryResults,
    },
    Failed {
        request_id: u64,
        message: String,
    },
    Health(BackendStatus),
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub session: ChatSession,
    pub backend_status: BackendStatus,
    backend: Arc<dyn QueryBackend>,
    backend_tx: mpsc::Sender<BackendEvent>,
    current_request: Option<JoinHandle<()>>,
    /// Chunks to request per query; the backend's default when `None`.
    top_k: Option<u32>,
}

impl AppState {
    pub fn new(
        session: ChatSession,
        backend: Arc<dyn QueryBackend>,
        backend_tx: mpsc::Sender<BackendEvent>,
    ) -> Self {
        AppState {
            session,
            backend_status: BackendStatus::Unknown,
            backend,
            backend_tx,
            current_request: None,
            top_k: None,
        }
    }

    pub fn with_top_k(mut self, top_k: Option<u32>) -> Self {
        self.top_k = top_k;
        self
    }

    /// Send `pending` to the backend on a new task.
    fn spawn_query(&mut self, pending: PendingQuery) {
        let backend = Arc::clone(&self.backend);
        let tx = self.backend_tx.clone();
        let id = pending.id;
        let request = pending.request(self.top_k);

        info!("Sending query #{}: {:?}", id, request.query);
        let handle = tokio::spawn(async move {
            let event = match backend.query(&request).await {
                Ok(results) => BackendEvent::Answer {
                    request_id: id,
                    results,
                },
                Err(e) => {
                    warn!("Query #{} failed: {}", id, e);
                    BackendEvent::Failed {
                        request_id: id,
                        message: e.to_string(),
                    }
                }
            };
            let _ = tx.send(event).await;
        });
        self.current_request = Some(handle);
    }

    /// Check the backend's health endpoint on a new task.
    pub fn spawn_health_check(&self) {
        let backend = Arc::clone(&self.backend);
        let tx = self.backend_tx.clone();
        tokio::spawn(async move {
            let status = match backend.health().await {
                Ok(_) => BackendStatus::Online,
                Err(e) => {
                    warn!("Backend health check failed: {}", e);
                    BackendStatus::Offline(e.to_string())
                }
            };
            let _ = tx.send(BackendEvent::Health(status)).await;
        });
    }

    /// Abort the in-flight query task, if any.
    pub fn cancel_request(&mut self) {
        if let Some(handle) = self.current_request.take() {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Replays the opening messages (greeting) to the UI, starts a health check,
/// then listens on:
/// 1. User commands from the TUI
/// 2. Backend events from spawned request tasks
///
/// Exits on `UserCommand::Quit` or when the command channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut backend_rx: mpsc::Receiver<BackendEvent>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    for message in state.session.messages() {
        let _ = ui_tx
            .send(UiUpdate::MessageAppended(Box::new(message.clone())))
            .await;
    }
    state.spawn_health_check();

    let mut backend_open = true;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            event = backend_rx.recv(), if backend_open => {
                match event {
                    Some(event) => {
                        handle_backend_event(&mut state, event, &ui_tx).await;
                    }
                    None => {
                        info!("Backend channel closed");
                        backend_open = false;
                    }
                }
            }
        }
    }

    state.cancel_request();
    info!("Application event loop exiting");
    Ok(())
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::Submit(text) => {
            let accepted = state.session.begin_query(&text);
            start_query(state, accepted, ui_tx).await;
        }
        UserCommand::SubmitExample(index) => {
            let accepted = state.session.begin_example(index);
            start_query(state, accepted, ui_tx).await;
        }
        UserCommand::ClearConversation => {
            info!("Clearing conversation");
            state.cancel_request();
            let greeting = state.session.clear().cloned();
            let _ = ui_tx.send(UiUpdate::Cleared).await;
            let _ = ui_tx.send(UiUpdate::Pending(false)).await;
            if let Some(message) = greeting {
                let _ = ui_tx.send(UiUpdate::MessageAppended(Box::new(message))).await;
            }
        }
        UserCommand::CheckHealth => {
            debug!("Health check requested");
            state.spawn_health_check();
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

/// Push the user message for an accepted query and send it to the backend.
async fn start_query(
    state: &mut AppState,
    accepted: Result<PendingQuery, SubmitRejected>,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match accepted {
        Ok(pending) => {
            if let Some(message) = state.session.messages().last() {
                let _ = ui_tx
                    .send(UiUpdate::MessageAppended(Box::new(message.clone())))
                    .await;
            }
            let _ = ui_tx.send(UiUpdate::Pending(true)).await;
            state.spawn_query(pending);
        }
        Err(SubmitRejected::Empty) => {
            debug!("Ignoring empty submission");
        }
        Err(reason) => {
            debug!("Submission rejected: {}", reason);
            let _ = ui_tx.send(UiUpdate::Notice(capitalize(&reason.to_string()))).await;
        }
    }
}

/// Handle the result of a backend task.
async fn handle_backend_event(
    state: &mut AppState,
    event: BackendEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let (request_id, outcome) = match event {
        BackendEvent::Health(status) => {
            info!("Backend status: {:?}", status);
            set_backend_status(state, status, ui_tx).await;
            return;
        }
        BackendEvent::Answer {
            request_id,
            results,
        } => {
            set_backend_status(state, BackendStatus::Online, ui_tx).await;
            (request_id, Ok(results))
        }
        BackendEvent::Failed {
            request_id,
            message,
        } => (request_id, Err(message)),
    };

    let Some(message) = state.session.complete(request_id, outcome).cloned() else {
        return;
    };
    state.current_request = None;
    info!(
        "Query #{} answered (mode: {:?}, error: {})",
        request_id, message.mode, message.is_error
    );
    let _ = ui_tx.send(UiUpdate::MessageAppended(Box::new(message))).await;
    let _ = ui_tx.send(UiUpdate::Pending(false)).await;
}

async fn set_backend_status(
    state: &mut AppState,
    status: BackendStatus,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    if state.backend_status != status {
        state.backend_status = status.clone();
        let _ = ui_tx.send(UiUpdate::BackendStatus(status)).await;
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
