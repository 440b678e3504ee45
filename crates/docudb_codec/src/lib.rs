//! # DocuDB Codec
//!
//! On-disk layout of DocuDB store files.
//!
//! A store file is a JSON array with exactly one record per line. This crate
//! owns everything about that layout and nothing else:
//!
//! - Framing constants (`[`, `]`, `,` and the CR LF separator)
//! - Newline sentinel substitution so a record always fits on one line
//! - Tail classification and append planning, so a record can be appended by
//!   rewriting a constant number of trailing bytes
//! - Splitting a file body into record texts and joining them back
//!
//! It performs no I/O.
//!
//! ## Usage
//!
//! ```
//! use docudb_codec::{encode_record, decode_record, join_records, split_records};
//!
//! let record = r#"{"note":"a\r\nb"}"#;
//! let stored = encode_record(record).unwrap();
//! assert_eq!(stored, r#"{"note":"a<|NEW-LINE|>b"}"#);
//!
//! let body = join_records(&[stored]);
//! let records = split_records(&body).unwrap();
//! assert_eq!(decode_record(records[0]), record);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod frame;
mod newline;

pub use error::{CodecError, CodecResult};
pub use frame::{
    check_record, classify_tail, join_records, plan_append, split_records, AppendPlan, TailShape,
    CLOSE, DELIMITER, MAX_BARE_LEN, OPEN, SEPARATOR, TAIL_LEN,
};
pub use newline::{escape_newlines, restore_newlines, ESCAPED_CRLF, NEWLINE_SENTINEL};

/// Prepares a raw record text for storage.
///
/// Substitutes the newline sentinel for every CR LF, escaped or raw, and
/// checks the result can be framed.
///
/// # Errors
///
/// Returns [`CodecError::EmptyRecord`] for an empty text.
pub fn encode_record(raw: &str) -> CodecResult<String> {
    let escaped = escape_newlines(raw).into_owned();
    check_record(&escaped)?;
    Ok(escaped)
}

/// Restores a stored record text, turning each sentinel back into the JSON
/// escape `\r\n`.
#[must_use]
pub fn decode_record(stored: &str) -> String {
    restore_newlines(stored).into_owned()
}
