//! Utilities for sanitizing error messages.
//!
//! Error text ends up in CSV cells and log lines, so control characters are
//! removed and long messages are truncated to a bounded length.

use crate::config::MAX_ERROR_MESSAGE_LENGTH;

/// Sanitizes an error message.
///
/// Newlines, tabs, and carriage returns become single spaces; every other
/// control character (C0, DEL, C1) is removed.
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Sanitizes and truncates an error message to `MAX_ERROR_MESSAGE_LENGTH` characters.
///
/// Truncation counts characters, never splitting a multi-byte sequence, and
/// appends a note with the original length.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    truncate_chars(&sanitize_error_message(message), MAX_ERROR_MESSAGE_LENGTH)
}

/// Truncates `message` to at most `max_chars` characters including the
/// truncation note.
pub fn truncate_chars(message: &str, max_chars: usize) -> String {
    let total = message.chars().count();
    if total <= max_chars {
        return message.to_string();
    }

    let note = format!("... (truncated, original length: {total} chars)");
    let keep = max_chars.saturating_sub(note.chars().count());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(&note);
    truncated
}
