//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while interpreting a store file's framing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The file does not follow the `[` SEP ... SEP `]` layout.
    #[error("malformed frame: {message}")]
    MalformedFrame {
        /// Description of what was found instead.
        message: String,
    },

    /// A record text contains a raw separator and cannot be framed.
    #[error("record contains a raw separator at byte {position}")]
    EmbeddedSeparator {
        /// Byte offset of the separator inside the record text.
        position: usize,
    },

    /// A record text is empty.
    #[error("record text is empty")]
    EmptyRecord,
}

impl CodecError {
    /// Create a malformed frame error.
    pub fn malformed_frame(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }
}
