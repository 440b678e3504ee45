//! Handler configuration.

use std::time::Duration;

/// Configuration for a [`crate::StorageHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Whether `connect` may create a missing store file.
    pub create_if_missing: bool,

    /// Whether every write is followed by `sync_all`.
    ///
    /// Writes are always flushed; this additionally waits for the OS to
    /// confirm the data and metadata reached the disk.
    pub sync_writes: bool,

    /// Maximum time to wait for the store lock (`None` = wait forever).
    pub lock_timeout: Option<Duration>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_writes: true,
            lock_timeout: None,
        }
    }
}

impl StorageConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether a missing store file is created on connect.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether writes are synced to disk.
    #[must_use]
    pub const fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Sets the lock acquisition timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }
}
