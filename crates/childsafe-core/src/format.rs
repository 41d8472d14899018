// Markdown-like answer text to HTML.
//
// The backend's answers use a small subset of markdown. Rendering is a fixed
// pipeline of substitutions, applied in this order:
//
//   0. normalise line endings, escape HTML special characters
//   1. **bold**        -> <strong>
//   2. *italic*        -> <em>
//   3. [text](url)     -> <a>
//   4. --- lines       -> <hr/>
//   5. newlines        -> <br/>
//
// Escaping happens first so that model output can never inject markup; every
// tag in the output comes from one of the later steps.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^\n]+?)\*\*").expect("bold pattern compiles"));

static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").expect("italic pattern compiles"));

// Targets may hold one level of balanced parentheses, as in
// `https://en.wikipedia.org/wiki/ChildSafe_(South_Africa)`.
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]\n]+)\]\(((?:[^()\s]|\([^()\s]*\))+)\)").expect("link pattern compiles")
});

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*-{3,}[ \t]*(?:\n|$)").expect("separator pattern compiles")
});

/// URL schemes allowed to become anchors.
const LINK_SCHEMES: &[&str] = &["http://", "https://", "mailto:"];

/// Render answer text to HTML.
pub fn render_html(text: &str) -> String {
    let escaped = escape_html(&text.replace("\r\n", "\n"));
    let bolded = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    let italicised = ITALIC.replace_all(&bolded, "<em>$1</em>");
    let linked = LINK.replace_all(&italicised, |caps: &Captures| {
        let label = &caps[1];
        let target = &caps[2];
        if is_linkable(target) {
            format!(r#"<a href="{target}" target="_blank" rel="noopener noreferrer">{label}</a>"#)
        } else {
            label.to_string()
        }
    });
    let separated = SEPARATOR.replace_all(&linked, "<hr/>");
    separated.replace('\n', "<br/>")
}

/// Escape the five HTML special characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Shorten `text` to at most `max` characters, appending "..." when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}

/// Whether `target` uses a scheme allowed in rendered links.
pub fn is_linkable(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    LINK_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
