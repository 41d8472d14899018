// Chat session state and the async orchestrator that connects the UI to the
// RAG backend.

pub mod app;
pub mod session;
