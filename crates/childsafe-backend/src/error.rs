// Failures of a backend request. The `Display` text is what the user sees
// in the conversation, so it is phrased as a description, not a debug dump.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("could not reach the assistant backend: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("the assistant backend did not answer within {secs}s")]
    Timeout { secs: u64 },

    #[error("backend returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("invalid response from backend: {0}")]
    Decode(String),

    #[error("backend reported status {0:?}")]
    Unhealthy(String),
}
