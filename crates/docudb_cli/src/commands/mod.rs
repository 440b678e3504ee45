//! CLI command implementations.

pub mod compact;
pub mod dump;
pub mod inspect;
pub mod verify;

use docudb_codec::{classify_tail, TailShape, TAIL_LEN};
use docudb_storage::{StorageConfig, StorageError, StorageHandler};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Result type for command implementations.
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Errors raised by the commands themselves.
#[derive(Error, Debug)]
pub enum CliError {
    /// A command that needs a store was run without `--path`.
    #[error("store path required for {command}")]
    MissingPath {
        /// The command that was run.
        command: &'static str,
    },

    /// `verify` found problems.
    #[error("verification failed with {problems} problem(s)")]
    VerificationFailed {
        /// Number of problems found.
        problems: usize,
    },
}

/// Framing of a store file as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameShape {
    /// Zero bytes.
    Empty,
    /// Brackets only.
    Bare,
    /// Records inside well-formed brackets.
    Populated,
    /// Anything else.
    Malformed(String),
}

impl FrameShape {
    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Bare => "bare",
            Self::Populated => "populated",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// Connects to an existing store file. Never creates one.
pub async fn open(path: &Path) -> CliResult<StorageHandler> {
    let mut handler = StorageHandler::with_config(StorageConfig::new().create_if_missing(false));
    handler.connect(path).await?;
    debug!(path = %path.display(), "opened store");
    Ok(handler)
}

/// Reads the framing of the connected store.
pub async fn read_frame(handler: &StorageHandler) -> CliResult<FrameShape> {
    let path = handler.path().ok_or(StorageError::NotConnected)?;
    let bytes = tokio::fs::read(path).await?;

    let start = bytes.len().saturating_sub(TAIL_LEN as usize);
    let shape = match classify_tail(bytes.len() as u64, &bytes[start..]) {
        Ok(TailShape::Empty) => FrameShape::Empty,
        Ok(TailShape::Bare) => FrameShape::Bare,
        Ok(TailShape::Populated) if bytes.starts_with(b"[") => FrameShape::Populated,
        Ok(TailShape::Populated) => {
            FrameShape::Malformed("file does not start with `[`".to_string())
        }
        Err(e) => FrameShape::Malformed(e.to_string()),
    };
    Ok(shape)
}
