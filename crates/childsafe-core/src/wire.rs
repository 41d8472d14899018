// JSON wire format of the RAG backend's `/query` and `/health` endpoints.
//
// The backend answers in one of two modes. Local answers carry report
// metadata for the chunks they were grounded on; web answers carry the
// search articles they summarised. Article fields differ by search provider
// (Google: `link`/`snippet`, Tavily: `url`/`content`), so both spellings are
// kept as separate optional fields.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    /// Number of chunks to retrieve. The backend defaults to 5 when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        QueryRequest {
            query: query.into(),
            top_k: None,
        }
    }

    pub fn with_top_k(mut self, top_k: Option<u32>) -> Self {
        self.top_k = top_k;
        self
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Top-level body of a successful `POST /query`: `{"results": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Option<QueryResults>,
}

/// Error body returned with non-2xx statuses, e.g. `{"detail": "Missing 'query' field"}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Which retrieval path the backend took for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Answered from the organisation's annual reports.
    Local,
    /// Summarised from web search articles.
    Web,
    #[serde(other)]
    Unknown,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Local => "reports",
            Mode::Web => "web",
            Mode::Unknown => "unknown",
        }
    }
}

/// The `results` payload produced by the backend's query orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResults {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "list_skipping_nulls")]
    pub articles: Vec<Article>,
    #[serde(default, deserialize_with = "list_skipping_nulls")]
    pub metadatas: Vec<ReportMetadata>,
    #[serde(default, deserialize_with = "list_skipping_nulls")]
    pub documents: Vec<String>,
    /// Query as rewritten by the backend for document search (local mode).
    #[serde(default)]
    pub rewritten: Option<String>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub error: Option<String>,
}

impl QueryResults {
    /// The answer text, if present and not blank.
    pub fn answer_text(&self) -> Option<&str> {
        self.answer.as_deref().filter(|a| !a.trim().is_empty())
    }

    /// The backend-reported error, if present and not blank.
    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// A web search result cited by a web-mode answer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl Article {
    pub fn title_or_default(&self) -> &str {
        non_blank(self.title.as_deref()).unwrap_or("Untitled")
    }

    /// Target URL: `link` (Google) first, then `url` (Tavily).
    pub fn href(&self) -> Option<&str> {
        non_blank(self.link.as_deref()).or_else(|| non_blank(self.url.as_deref()))
    }

    /// Short text: `snippet` (Google) first, then `content` (Tavily).
    pub fn excerpt(&self) -> Option<&str> {
        non_blank(self.snippet.as_deref()).or_else(|| non_blank(self.content.as_deref()))
    }
}

/// Metadata of a report chunk used to ground a local-mode answer.
///
/// Ingestion stores both `report_year` and the PDF `source` path on every
/// chunk, which is why they are not serde aliases of one another.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportMetadata {
    #[serde(default)]
    pub report_year: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub page: Option<PageRef>,
}

impl ReportMetadata {
    pub fn label(&self) -> &str {
        non_blank(self.report_year.as_deref())
            .or_else(|| non_blank(self.source.as_deref()))
            .unwrap_or("unknown report")
    }

    pub fn page_label(&self) -> String {
        match &self.page {
            Some(page) => page.to_string(),
            None => "?".to_string(),
        }
    }
}

/// Page numbers are integers from ingestion but may arrive as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PageRef {
    Number(u64),
    Text(String),
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRef::Number(n) => write!(f, "{n}"),
            PageRef::Text(s) => f.write_str(s),
        }
    }
}

/// Decode a list that may itself be `null` or contain `null` entries
/// (chunks stored without metadata come back as `null`).
fn list_skipping_nulls<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
