//! Error types for storage operations.

use docudb_codec::CodecError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred while running `operation`.
    #[error("I/O error during {operation}: {source}")]
    Io {
        /// Name of the handler operation that failed.
        operation: &'static str,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The handler has no active connection.
    #[error("storage is not connected")]
    NotConnected,

    /// The store path does not end in `.json`.
    #[error("store file must have a .json extension: {}", .path.display())]
    InvalidExtension {
        /// The rejected path.
        path: PathBuf,
    },

    /// The store file does not exist and creation was not allowed.
    #[error("store file not found: {}", .path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The store file cannot be both read and written.
    #[error("permission denied on store file: {}", .path.display())]
    PermissionDenied {
        /// The inaccessible path.
        path: PathBuf,
    },

    /// The store path exists but is not a regular file.
    #[error("store path is not a regular file: {}", .path.display())]
    NotAFile {
        /// The offending path.
        path: PathBuf,
    },

    /// Waiting for the store lock exceeded the configured timeout.
    #[error("timed out waiting for the store lock during {operation}")]
    LockTimeout {
        /// Name of the handler operation that gave up.
        operation: &'static str,
    },

    /// The store file contents are not valid UTF-8.
    #[error("store file is not valid UTF-8")]
    InvalidUtf8,

    /// The store file framing is broken, or a record cannot be framed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl StorageError {
    /// Returns true for errors caused by a missing or unusable connection.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            StorageError::NotConnected
                | StorageError::InvalidExtension { .. }
                | StorageError::NotFound { .. }
                | StorageError::PermissionDenied { .. }
                | StorageError::NotAFile { .. }
        )
    }
}

/// Attaches the failing operation's name to I/O errors.
pub(crate) trait IoContext<T> {
    fn during(self, operation: &'static str) -> StorageResult<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn during(self, operation: &'static str) -> StorageResult<T> {
        self.map_err(|source| StorageError::Io { operation, source })
    }
}
