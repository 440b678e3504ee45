//! Store file framing.
//!
//! A non-empty store file is a JSON array laid out one record per line:
//!
//! ```text
//! [ SEP record1 , SEP record2 , ... SEP recordN SEP ]
//! ```
//!
//! where `SEP` is CR LF. A zero-byte file is an empty array, as is a bare
//! `[` SEP `]`. The layout lets a record be appended by cutting the trailing
//! `SEP ]` and writing `, SEP record SEP ]`, so an append never touches more
//! than a constant number of existing bytes.

use crate::error::{CodecError, CodecResult};

/// Separator between records and around the brackets.
pub const SEPARATOR: &str = "\r\n";

/// Opening bracket of the array.
pub const OPEN: &str = "[";

/// Closing bracket of the array.
pub const CLOSE: &str = "]";

/// Delimiter written between two records.
pub const DELIMITER: &str = ",";

/// Longest file that can still be a bare, record-less frame (`[` SEP SEP `]`).
pub const MAX_BARE_LEN: u64 = 6;

/// Number of trailing bytes needed by [`classify_tail`].
pub const TAIL_LEN: u64 = MAX_BARE_LEN;

/// Length of the `SEP ]` suffix of a populated file.
const CLOSING_LEN: u64 = (SEPARATOR.len() + CLOSE.len()) as u64;

/// Shape of a store file as seen from its last bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailShape {
    /// Zero bytes.
    Empty,
    /// Brackets only, no records.
    Bare,
    /// At least one record, ending in `SEP ]`.
    Populated,
}

/// The minimal rewrite needed to append one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendPlan {
    /// Length the file must be cut to before writing.
    pub truncate_to: u64,
    /// Bytes to write at `truncate_to`.
    pub bytes: Vec<u8>,
}

/// Classifies a file of `size` bytes whose last bytes are `tail`.
///
/// `tail` must hold the last `min(size, TAIL_LEN)` bytes of the file.
///
/// # Errors
///
/// Returns [`CodecError::MalformedFrame`] if the file is neither empty, bare,
/// nor terminated by `SEP ]`.
pub fn classify_tail(size: u64, tail: &[u8]) -> CodecResult<TailShape> {
    if size == 0 {
        return Ok(TailShape::Empty);
    }

    if size <= MAX_BARE_LEN {
        let compact: Vec<u8> = tail
            .iter()
            .copied()
            .filter(|b| *b != b'\r' && *b != b'\n')
            .collect();
        if compact == b"[]" {
            return Ok(TailShape::Bare);
        }
    }

    let closing = [SEPARATOR.as_bytes(), CLOSE.as_bytes()].concat();
    if size > MAX_BARE_LEN && tail.ends_with(&closing) {
        return Ok(TailShape::Populated);
    }

    Err(CodecError::malformed_frame(format!(
        "file of {size} bytes does not end with the closing separator and bracket"
    )))
}

/// Checks that `record` can be framed as a single line.
///
/// # Errors
///
/// Fails if the record is empty or still contains a raw separator.
pub fn check_record(record: &str) -> CodecResult<()> {
    if record.is_empty() {
        return Err(CodecError::EmptyRecord);
    }
    if let Some(position) = record.find(SEPARATOR) {
        return Err(CodecError::EmbeddedSeparator { position });
    }
    Ok(())
}

/// Plans the append of `record` to a file of `size` bytes with the given shape.
///
/// # Errors
///
/// Fails if `record` cannot be framed (see [`check_record`]).
pub fn plan_append(shape: TailShape, size: u64, record: &str) -> CodecResult<AppendPlan> {
    check_record(record)?;

    let plan = match shape {
        TailShape::Empty | TailShape::Bare => AppendPlan {
            truncate_to: 0,
            bytes: [OPEN, SEPARATOR, record, SEPARATOR, CLOSE]
                .concat()
                .into_bytes(),
        },
        TailShape::Populated => AppendPlan {
            truncate_to: size.saturating_sub(CLOSING_LEN),
            bytes: [DELIMITER, SEPARATOR, record, SEPARATOR, CLOSE]
                .concat()
                .into_bytes(),
        },
    };

    Ok(plan)
}

/// Joins already-escaped records into a complete file body.
///
/// An empty slice yields the bare frame `[` SEP `]`.
#[must_use]
pub fn join_records<S: AsRef<str>>(records: &[S]) -> String {
    let mut out = String::from(OPEN);
    out.push_str(SEPARATOR);

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push_str(DELIMITER);
            out.push_str(SEPARATOR);
        }
        out.push_str(record.as_ref());
    }

    if !records.is_empty() {
        out.push_str(SEPARATOR);
    }
    out.push_str(CLOSE);
    out
}

/// Splits a complete file body into its (still escaped) record texts.
///
/// A zero-length body yields no records.
///
/// # Errors
///
/// Returns [`CodecError::MalformedFrame`] if the body is not bracketed.
pub fn split_records(body: &str) -> CodecResult<Vec<&str>> {
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let inner = body
        .strip_prefix(OPEN)
        .and_then(|rest| rest.strip_suffix(CLOSE))
        .ok_or_else(|| CodecError::malformed_frame("file body is not enclosed in brackets"))?;

    Ok(inner
        .split(SEPARATOR)
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_suffix(DELIMITER).unwrap_or(line))
        .collect())
}
