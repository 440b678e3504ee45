//! Byte-exact store file vectors.
//!
//! Each vector lists the record texts appended, in order, to a zero-byte
//! store and the exact file bytes that must result. Loading the file back
//! yields the same record texts.

use serde::{Deserialize, Serialize};

/// Expected store file contents after a sequence of appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Raw record texts, appended in order.
    pub records: Vec<String>,
    /// Expected file bytes.
    pub expected: Vec<u8>,
}

impl FrameVector {
    fn new(id: &str, description: &str, records: &[&str], expected: &[u8]) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            records: records.iter().map(|r| r.to_string()).collect(),
            expected: expected.to_vec(),
        }
    }
}

/// Append vectors starting from a zero-byte file.
pub fn frame_vectors() -> Vec<FrameVector> {
    vec![
        FrameVector::new("empty", "no appends", &[], b""),
        FrameVector::new(
            "single",
            "one record is wrapped in brackets",
            &[r#"{"a":1}"#],
            b"[\r\n{\"a\":1}\r\n]",
        ),
        FrameVector::new(
            "pair",
            "second record cuts the closing SEP ] and adds a delimiter",
            &[r#"{"a":1}"#, r#"{"a":2}"#],
            b"[\r\n{\"a\":1},\r\n{\"a\":2}\r\n]",
        ),
        FrameVector::new(
            "triple",
            "three records",
            &["{}", "{}", "{}"],
            b"[\r\n{},\r\n{},\r\n{}\r\n]",
        ),
        FrameVector::new(
            "escaped_newline",
            "a JSON-escaped CR LF is stored as the sentinel",
            &[r#"{"t":"a\r\nb"}"#],
            b"[\r\n{\"t\":\"a<|NEW-LINE|>b\"}\r\n]",
        ),
        FrameVector::new(
            "escaped_backslash",
            "an escaped backslash before `r` is not a newline",
            &[r#"{"t":"\\r\\n"}"#],
            b"[\r\n{\"t\":\"\\\\r\\\\n\"}\r\n]",
        ),
        FrameVector::new(
            "lone_lf",
            "a lone LF is not a separator and is stored as is",
            &["{\"t\":\"a\nb\"}"],
            b"[\r\n{\"t\":\"a\nb\"}\r\n]",
        ),
    ]
}

/// Existing file contents that must be accepted as empty before an append.
pub fn bare_files() -> Vec<&'static [u8]> {
    vec![&b""[..], &b"[]"[..], &b"[\r\n]"[..], &b"[\r\n\r\n]"[..]]
}

/// Existing file contents an append must refuse to touch.
pub fn malformed_files() -> Vec<&'static [u8]> {
    vec![
        &b"x"[..],
        &b"{}"[..],
        &b"[\r\n{\"a\":1}"[..],
        &b"[\r\n{\"a\":1}]"[..],
        &b"[\r\n{\"a\":1}\r\n]\r\n"[..],
        &b"garbage that is long enough"[..],
    ]
}
