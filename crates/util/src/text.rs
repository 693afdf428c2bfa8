//! Text helpers for run logging and log file naming.

/// Reduce a flow name to characters safe for a file name.
///
/// Alphanumerics, underscore, hyphen, and space are kept; every other
/// character becomes an underscore. Surrounding whitespace is trimmed and an
/// all-unsafe name falls back to `flow`.
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | ' ') { c } else { '_' })
        .collect();
    let trimmed = stem.trim();
    if trimmed.is_empty() { "flow".to_string() } else { trimmed.to_string() }
}

/// Truncate text to at most `max_chars` characters for log previews.
///
/// Counts characters, not bytes, so multi-byte text is never split mid
/// character. An ellipsis marker is appended when truncation happened.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}
