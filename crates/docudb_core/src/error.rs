//! Error types for DocuDB core.

use docudb_codec::CodecError;
use docudb_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in DocuDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage handler error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Store file layout error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A stored record is not valid JSON, or a record could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A schema definition or its options are malformed.
    #[error("invalid schema: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// A content field violates the schema.
    #[error("validation failed for field `{field}`: {message}")]
    Validation {
        /// Name of the offending field.
        field: String,
        /// Description of the violation.
        message: String,
    },

    /// Content handed to a schema is not a JSON object.
    #[error("invalid content: {message}")]
    InvalidContent {
        /// Description of the problem.
        message: String,
    },

    /// A stored record cannot be turned back into a document.
    #[error("invalid stored record: {message}")]
    InvalidRecord {
        /// Description of the problem.
        message: String,
    },
}

/// Broad category of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed schema definition or options.
    Config,
    /// Content does not satisfy a schema.
    Validation,
    /// No usable store connection.
    Connection,
    /// Underlying read or write failure, including lock timeouts.
    Io,
    /// The store file or a record in it is damaged.
    Corruption,
}

impl CoreError {
    /// Creates a schema configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a field validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid content error.
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }

    /// Creates an invalid stored record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Validation { .. } | Self::InvalidContent { .. } => ErrorKind::Validation,
            Self::Storage(e) if e.is_connection() => ErrorKind::Connection,
            Self::Storage(StorageError::Io { .. } | StorageError::LockTimeout { .. }) => {
                ErrorKind::Io
            }
            Self::Storage(_) | Self::Codec(_) | Self::Json(_) | Self::InvalidRecord { .. } => {
                ErrorKind::Corruption
            }
        }
    }
}
