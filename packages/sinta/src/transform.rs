//! Text clean-ups applied to raw node text before it lands in a record.

/// Written in place of optional values the page does not carry.
pub const PLACEHOLDER: &str = "N/A";

const UNIVERSITY_PREFIX: &str = "Universitas ";

/// Collapses runs of whitespace (including newlines) to single spaces and trims.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text after the first colon, trimmed. Text without a colon is returned trimmed.
pub fn value_after_colon(text: &str) -> String {
    match text.split_once(':') {
        Some((_, value)) => value.trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Text before the first colon, trimmed; `None` when there is no colon.
pub fn label_before_colon(text: &str) -> Option<&str> {
    text.split_once(':').map(|(label, _)| label.trim())
}

/// Drops the first comma-separated entry (the author's own name in co-author lists).
pub fn drop_leading_self_reference(text: &str) -> String {
    match text.split_once(',') {
        Some((_, rest)) => rest.trim().to_string(),
        None => text.trim().to_string(),
    }
}

pub fn first_token(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

pub fn last_token(text: &str) -> Option<&str> {
    text.split_whitespace().next_back()
}

/// `nth_token_from_end(s, 0)` is the last token.
pub fn nth_token_from_end(text: &str, n: usize) -> Option<&str> {
    text.split_whitespace().rev().nth(n)
}

pub fn strip_university_prefix(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix(UNIVERSITY_PREFIX)
        .unwrap_or(text)
        .trim()
        .to_string()
}

pub fn trim_commas(text: &str) -> String {
    text.trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

pub fn or_placeholder(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
