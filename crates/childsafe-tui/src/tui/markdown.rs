// Terminal rendering of the answers' markdown subset.
//
// Mirrors the HTML formatter: **bold**, *italic*, [label](url) and lines of
// three or more dashes. Each source line becomes one `Line`; wrapping is
// left to the paragraph that displays them.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use childsafe_core::format::is_linkable;

/// Width of the rule drawn for a `---` separator line.
const RULE_WIDTH: usize = 24;

/// Convert markdown-like text into styled lines.
pub fn to_lines(text: &str, base: Style) -> Vec<Line<'static>> {
    text.replace("\r\n", "\n")
        .split('\n')
        .map(|line| {
            if is_separator(line) {
                Line::from(Span::styled(
                    "─".repeat(RULE_WIDTH),
                    Style::default().fg(Color::DarkGray),
                ))
            } else {
                parse_markdown_line(line, base)
            }
        })
        .collect()
}

fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-')
}

/// Parse one line, turning bold, italic and link markup into styled spans.
///
/// Unclosed markers are kept as literal text.
fn parse_markdown_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**").filter(|&end| end > 0) {
                flush(&mut spans, &mut plain, base);
                spans.push(Span::styled(
                    after[..end].to_string(),
                    base.add_modifier(Modifier::BOLD),
                ));
                rest = &after[end + 2..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix('*') {
            if let Some(end) = after.find('*').filter(|&end| end > 0) {
                flush(&mut spans, &mut plain, base);
                spans.push(Span::styled(
                    after[..end].to_string(),
                    base.add_modifier(Modifier::ITALIC),
                ));
                rest = &after[end + 1..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix('[') {
            if let Some((label, target, remainder)) = split_link(after) {
                flush(&mut spans, &mut plain, base);
                if is_linkable(target) {
                    spans.push(Span::styled(
                        label.to_string(),
                        base.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
                    ));
                    spans.push(Span::styled(
                        format!(" ({target})"),
                        Style::default().fg(Color::DarkGray),
                    ));
                } else {
                    spans.push(Span::styled(label.to_string(), base));
                }
                rest = remainder;
                continue;
            }
        }

        plain.push(c);
        rest = &rest[c.len_utf8()..];
    }
    flush(&mut spans, &mut plain, base);

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Split `label](target)rest` (the text after an opening `[`).
///
/// The target may hold one level of balanced parentheses, matching the HTML
/// formatter.
fn split_link(text: &str) -> Option<(&str, &str, &str)> {
    let close = text.find(']')?;
    let label = &text[..close];
    let after = text[close + 1..].strip_prefix('(')?;
    let end = target_end(after)?;
    let target = &after[..end];
    if label.is_empty() || target.is_empty() {
        return None;
    }
    Some((label, target, &after[end + 1..]))
}

/// Byte offset of the `)` closing a link target.
fn target_end(text: &str) -> Option<usize> {
    let mut nested = false;
    for (i, c) in text.char_indices() {
        match c {
            c if c.is_whitespace() => return None,
            '(' if nested => return None,
            '(' => nested = true,
            ')' if nested => nested = false,
            ')' => return Some(i),
            _ => {}
        }
    }
    None
}

fn flush(spans: &mut Vec<Span<'static>>, plain: &mut String, base: Style) {
    if !plain.is_empty() {
        spans.push(Span::styled(std::mem::take(plain), base));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
