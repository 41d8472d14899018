// HTTP access to the ChildSafe RAG API.

pub mod client;
pub mod error;

pub use client::{HttpBackend, QueryBackend};
pub use error::BackendError;
