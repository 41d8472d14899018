// Chat messages and composition of bot answers from backend results.

use chrono::{DateTime, Local};

use crate::format::{render_html, truncate_chars};
use crate::wire::{Mode, QueryResults};

/// Shown when the backend answered without an `answer` field.
pub const NO_ANSWER: &str = "No answer was returned.";

/// Maximum characters of an article excerpt listed under an answer.
pub const EXCERPT_CHARS: usize = 200;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// One entry in the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    /// Markdown-like source text.
    pub source: String,
    /// `source` rendered to HTML.
    pub content: String,
    pub mode: Option<Mode>,
    /// The backend's rewritten search query, when it reported one.
    pub rewritten: Option<String>,
    pub is_error: bool,
    pub sent_at: DateTime<Local>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into())
    }

    pub fn bot(markdown: impl Into<String>) -> Self {
        Self::new(Role::Bot, markdown.into())
    }

    /// A bot message describing a failed request.
    pub fn error(description: impl AsRef<str>) -> Self {
        let mut msg = Self::new(Role::Bot, format!("Error: {}", description.as_ref()));
        msg.is_error = true;
        msg
    }

    /// Build the bot reply for a backend response.
    ///
    /// A reported `error` without an answer becomes an error message. Otherwise
    /// the answer is followed by a sources block (web articles) and a report
    /// references block (local chunks) when the backend returned any.
    pub fn from_results(results: &QueryResults) -> Self {
        let answer = results.answer_text();
        if let (None, Some(error)) = (answer, results.error_text()) {
            let mut msg = Self::error(error);
            msg.mode = results.mode;
            return msg;
        }

        let mut source = answer.unwrap_or(NO_ANSWER).trim().to_string();
        if let Some(block) = sources_block(results) {
            source.push_str("\n\n---\n");
            source.push_str(&block);
        }
        if let Some(block) = references_block(results) {
            source.push_str("\n\n---\n");
            source.push_str(&block);
        }

        let mut msg = Self::bot(source);
        msg.mode = results.mode;
        msg.rewritten = results
            .rewritten
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        msg
    }

    fn new(role: Role, source: String) -> Self {
        let content = render_html(&source);
        Message {
            role,
            source,
            content,
            mode: None,
            rewritten: None,
            is_error: false,
            sent_at: Local::now(),
        }
    }
}

fn sources_block(results: &QueryResults) -> Option<String> {
    if results.articles.is_empty() {
        return None;
    }
    let mut lines = vec!["**Sources**".to_string()];
    for article in &results.articles {
        let mut title = citation_text(article.title_or_default());
        if title.is_empty() {
            title = "Untitled".to_string();
        }
        match article.href() {
            Some(href) => lines.push(format!("[{title}]({})", encode_href(href))),
            None => lines.push(title),
        }
        if let Some(excerpt) = article.excerpt() {
            let short = truncate_chars(&citation_text(excerpt), EXCERPT_CHARS);
            if !short.is_empty() {
                lines.push(format!("*{short}*"));
            }
        }
    }
    Some(lines.join("\n"))
}

/// Flatten article text onto one line with no markup of its own: asterisks
/// are dropped and square brackets become parentheses.
fn citation_text(text: &str) -> String {
    let flat: String = text
        .chars()
        .filter(|&c| c != '*')
        .map(|c| match c {
            '[' => '(',
            ']' => ')',
            other => other,
        })
        .collect();
    flat.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Percent-encode the characters that would end a markdown link target early.
fn encode_href(href: &str) -> String {
    let mut out = String::with_capacity(href.len());
    for c in href.trim().chars() {
        match c {
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            c if c.is_whitespace() => out.push_str("%20"),
            other => out.push(other),
        }
    }
    out
}

fn references_block(results: &QueryResults) -> Option<String> {
    if results.metadatas.is_empty() {
        return None;
    }
    let mut seen: Vec<(String, String)> = Vec::new();
    for meta in &results.metadatas {
        let key = (meta.label().to_string(), meta.page_label());
        if !seen.contains(&key) {
            seen.push(key);
        }
    }
    let mut lines = vec!["**Report references**".to_string()];
    lines.extend(
        seen.into_iter()
            .map(|(label, page)| format!("Report {label}, page {page}")),
    );
    Some(lines.join("\n"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Article, PageRef, ReportMetadata};

    #[test]
    fn user_message_is_formatted() {
        let msg = Message::user("Is **road safety** covered?");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Is <strong>road safety</strong> covered?");
        assert!(!msg.is_error);
    }

    #[test]
    fn error_message_contains_description() {
        let msg = Message::error("connection refused");
        assert_eq!(msg.role, Role::Bot);
        assert!(msg.is_error);
        assert_eq!(msg.source, "Error: connection refused");
    }

    #[test]
    fn answer_without_citations() {
        let results = QueryResults {
            answer: Some("ChildSafe is a nonprofit.\n".into()),
            mode: Some(Mode::Local),
            rewritten: Some("  What is ChildSafe South Africa?  ".into()),
            ..Default::default()
        };
        let msg = Message::from_results(&results);
        assert_eq!(msg.source, "ChildSafe is a nonprofit.");
        assert_eq!(msg.mode, Some(Mode::Local));
        assert_eq!(msg.rewritten.as_deref(), Some("What is ChildSafe South Africa?"));
    }

    #[test]
    fn missing_answer_uses_placeholder() {
        let msg = Message::from_results(&QueryResults::default());
        assert_eq!(msg.source, NO_ANSWER);
        assert!(!msg.is_error);
    }

    #[test]
    fn backend_error_without_answer_is_surfaced() {
        let results = QueryResults {
            error: Some("No documents in collection".into()),
            ..Default::default()
        };
        let msg = Message::from_results(&results);
        assert!(msg.is_error);
        assert_eq!(msg.source, "Error: No documents in collection");
    }

    #[test]
    fn answer_wins_over_error() {
        let results = QueryResults {
            answer: Some("Partial answer".into()),
            error: Some("timeout on one shard".into()),
            ..Default::default()
        };
        let msg = Message::from_results(&results);
        assert!(!msg.is_error);
        assert_eq!(msg.source, "Partial answer");
    }

    #[test]
    fn web_answer_lists_sources() {
        let results = QueryResults {
            answer: Some("- ChildSafe ran a campaign".into()),
            mode: Some(Mode::Web),
            articles: vec![
                Article {
                    title: Some("Campaign launch".into()),
                    link: Some("https://news.example/a".into()),
                    snippet: Some("ChildSafe launched...".into()),
                    ..Default::default()
                },
                Article {
                    title: None,
                    url: None,
                    content: Some("x".repeat(250)),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let msg = Message::from_results(&results);
        let expected_excerpt = format!("*{}...*", "x".repeat(EXCERPT_CHARS));
        assert_eq!(
            msg.source,
            format!(
                "- ChildSafe ran a campaign\n\n---\n**Sources**\n\
                 [Campaign launch](https://news.example/a)\n*ChildSafe launched...*\n\
                 Untitled\n{expected_excerpt}"
            )
        );
        assert!(msg
            .content
            .contains(r#"<a href="https://news.example/a" target="_blank" rel="noopener noreferrer">Campaign launch</a>"#));
        assert!(msg.content.contains("<hr/>"));
    }

    #[test]
    fn local_answer_lists_distinct_references() {
        let meta = |year: &str, page: u64| ReportMetadata {
            report_year: Some(year.into()),
            source: Some(format!("data/{year}.pdf")),
            page: Some(PageRef::Number(page)),
        };
        let results = QueryResults {
            answer: Some("According to the 2019-2020 report (page 5)...".into()),
            mode: Some(Mode::Local),
            metadatas: vec![meta("2019-2020", 5), meta("2019-2020", 5), meta("2011", 2)],
            ..Default::default()
        };
        let msg = Message::from_results(&results);
        assert!(msg.source.ends_with(
            "---\n**Report references**\nReport 2019-2020, page 5\nReport 2011, page 2"
        ));
    }
    #[test]
    fn source_with_parentheses_in_url_keeps_full_href() {
        let results = QueryResults {
            answer: Some("ChildSafe has a Wikipedia page.".into()),
            articles: vec![Article {
                title: Some("ChildSafe (South Africa)".into()),
                url: Some("https://en.wikipedia.org/wiki/ChildSafe_(South_Africa)".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let msg = Message::from_results(&results);
        assert!(msg.source.ends_with(
            "[ChildSafe (South Africa)](https://en.wikipedia.org/wiki/ChildSafe_%28South_Africa%29)"
        ));
        assert!(msg.content.contains(
            r#"<a href="https://en.wikipedia.org/wiki/ChildSafe_%28South_Africa%29" target="_blank" rel="noopener noreferrer">ChildSafe (South Africa)</a>"#
        ));
    }

    #[test]
    fn bracketed_title_still_renders_as_link() {
        let results = QueryResults {
            answer: Some("See the report.".into()),
            articles: vec![Article {
                title: Some("ChildSafe [2023] report".into()),
                link: Some("https://news.example/report".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let msg = Message::from_results(&results);
        assert!(msg.content.contains(
            r#"<a href="https://news.example/report" target="_blank" rel="noopener noreferrer">ChildSafe (2023) report</a>"#
        ));
        assert!(!msg.content.contains("]("));
    }

    #[test]
    fn asterisks_in_excerpt_do_not_break_emphasis() {
        let results = QueryResults {
            answer: Some("Road safety tips.".into()),
            articles: vec![Article {
                title: Some("Tips".into()),
                snippet: Some("cars * kids *\n roads".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let msg = Message::from_results(&results);
        assert!(msg.source.ends_with("Tips\n*cars kids roads*"));
        assert!(msg.content.ends_with("Tips<br/><em>cars kids roads</em>"));
    }

    #[test]
    fn title_made_only_of_markup_falls_back_to_untitled() {
        let results = QueryResults {
            answer: Some("Answer".into()),
            articles: vec![Article {
                title: Some("***".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let msg = Message::from_results(&results);
        assert!(msg.source.ends_with("**Sources**\nUntitled"));
    }
}
