//! Newline sentinel substitution.
//!
//! The separator between records is CR LF, so a stored line must never
//! contain one. Records are JSON texts, where a CR LF inside a string is
//! written as the escape `\r\n`. Before framing, every such escape (and any
//! raw CR LF) is replaced by [`NEWLINE_SENTINEL`]; after splitting, the
//! sentinel is turned back into the `\r\n` escape.

use crate::frame::SEPARATOR;
use std::borrow::Cow;

/// Token substituted for CR LF inside record texts.
pub const NEWLINE_SENTINEL: &str = "<|NEW-LINE|>";

/// The JSON string escape for CR LF.
pub const ESCAPED_CRLF: &str = "\\r\\n";

/// Replaces every CR LF in `text` with [`NEWLINE_SENTINEL`].
///
/// Both the JSON escape `\r\n` and a raw CR LF are replaced. Escape
/// sequences are read in pairs, so an escaped backslash followed by `r` is
/// left alone. Borrows when there is nothing to replace.
#[must_use]
pub fn escape_newlines(text: &str) -> Cow<'_, str> {
    if !text.contains(SEPARATOR) && !text.contains(ESCAPED_CRLF) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(position) = rest.find(|c: char| c == '\\' || c == '\r') {
        escaped.push_str(&rest[..position]);
        let tail = &rest[position..];

        if let Some(after) = tail
            .strip_prefix(ESCAPED_CRLF)
            .or_else(|| tail.strip_prefix(SEPARATOR))
        {
            escaped.push_str(NEWLINE_SENTINEL);
            rest = after;
            continue;
        }

        // A backslash takes the next character with it, unless that is a
        // raw CR which may start a separator.
        let len = match tail.chars().nth(1) {
            Some(next) if tail.starts_with('\\') && next != '\r' => 1 + next.len_utf8(),
            _ => 1,
        };
        escaped.push_str(&tail[..len]);
        rest = &tail[len..];
    }
    escaped.push_str(rest);
    Cow::Owned(escaped)
}

/// Replaces every [`NEWLINE_SENTINEL`] in `text` with the JSON escape `\r\n`.
#[must_use]
pub fn restore_newlines(text: &str) -> Cow<'_, str> {
    if text.contains(NEWLINE_SENTINEL) {
        Cow::Owned(text.replace(NEWLINE_SENTINEL, ESCAPED_CRLF))
    } else {
        Cow::Borrowed(text)
    }
}
