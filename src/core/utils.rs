use chrono::{DateTime, Utc};

/// Escapes special characters for Telegram MarkdownV2.
///
/// Every character from the MarkdownV2 reserved set (plus the backslash
/// itself) gets a leading backslash; everything else passes through.
///
/// # Example
///
/// ```
/// use mediagrab::core::utils::escape_markdown_v2;
///
/// assert_eq!(escape_markdown_v2("v1.2 (beta)!"), "v1\\.2 \\(beta\\)\\!");
/// ```
pub fn escape_markdown_v2(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        match c {
            '\\' | '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|' | '{' | '}'
            | '.' | '!' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Formats a stored timestamp for chat output, e.g. `2024-03-01 10:15 UTC`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}
