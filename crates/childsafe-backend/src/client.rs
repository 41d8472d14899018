// RAG API client.
//
// `POST <url>` with `{"query": ..., "top_k": ...}` returns
// `{"results": {...}}`; `GET <health_url>` returns `{"status": "ok"}`.
// Requests are sent once: there are no retries, and the only time limit is
// the optional client timeout from config.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use childsafe_core::config::BackendConfig;
use childsafe_core::format::truncate_chars;
use childsafe_core::wire::{ErrorBody, HealthResponse, QueryRequest, QueryResponse, QueryResults};

use crate::error::BackendError;

/// Longest slice of a raw error body quoted in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// QueryBackend
// ---------------------------------------------------------------------------

/// Something that can answer chat queries. The app loop only talks to the
/// backend through this trait so it can run against an in-process fake.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Send one `/query` request and return the backend's results payload.
    async fn query(&self, request: &QueryRequest) -> Result<QueryResults, BackendError>;

    /// Check the backend, returning its reported status.
    async fn health(&self) -> Result<String, BackendError>;
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// reqwest-based client for the FastAPI backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    query_url: String,
    health_url: String,
    timeout_secs: Option<u64>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(BackendError::Client)?;

        Ok(HttpBackend {
            http,
            query_url: config.url.clone(),
            health_url: config.resolved_health_url(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    fn request_error(&self, err: reqwest::Error) -> BackendError {
        match self.timeout_secs {
            Some(secs) if err.is_timeout() => BackendError::Timeout { secs },
            _ => BackendError::Transport(err),
        }
    }
}

#[async_trait]
impl QueryBackend for HttpBackend {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResults, BackendError> {
        debug!(url = %self.query_url, top_k = ?request.top_k, "sending query");

        let response = self
            .http
            .post(&self.query_url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(e))?;

        if !status.is_success() {
            warn!(%status, "query rejected by backend");
            return Err(status_error(status, &body));
        }
        parse_query_body(&body)
    }

    async fn health(&self) -> Result<String, BackendError> {
        let response = self
            .http
            .get(&self.health_url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(e))?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let health: HealthResponse =
            serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))?;
        if health.status.eq_ignore_ascii_case("ok") {
            Ok(health.status)
        } else {
            Err(BackendError::Unhealthy(health.status))
        }
    }
}

// ---------------------------------------------------------------------------
// Body parsing helpers
// ---------------------------------------------------------------------------

/// Decode a successful `/query` body. A body without `results` yields empty
/// results.
pub(crate) fn parse_query_body(body: &str) -> Result<QueryResults, BackendError> {
    let response: QueryResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))?;
    Ok(response.results.unwrap_or_default())
}

/// Describe a non-2xx response, preferring FastAPI's `detail` string.
pub(crate) fn status_error(status: StatusCode, body: &str) -> BackendError {
    let detail = match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => err.detail,
        Err(_) if !body.trim().is_empty() => truncate_chars(body, MAX_ERROR_BODY_CHARS),
        Err(_) => status.canonical_reason().unwrap_or("no details").to_string(),
    };
    BackendError::Status {
        status: status.as_u16(),
        detail,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
