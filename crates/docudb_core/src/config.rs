//! Database configuration.

use docudb_storage::StorageConfig;
use std::time::Duration;

/// Configuration for connecting a [`crate::Database`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether to create the store file if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to sync the store file to disk after every write (safer but slower).
    pub sync_writes: bool,

    /// Maximum time to wait for the store lock (`None` = wait forever).
    pub lock_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_writes: true,
            lock_timeout: None,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store file if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync after every write.
    #[must_use]
    pub const fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Sets the store lock timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Returns the storage handler configuration.
    #[must_use]
    pub const fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            create_if_missing: self.create_if_missing,
            sync_writes: self.sync_writes,
            lock_timeout: self.lock_timeout,
        }
    }
}

impl From<&Config> for StorageConfig {
    fn from(config: &Config) -> Self {
        config.storage_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(config.sync_writes);
        assert!(config.lock_timeout.is_none());
        assert_eq!(config.storage_config(), StorageConfig::default());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .create_if_missing(false)
            .sync_writes(false)
            .lock_timeout(Some(Duration::from_secs(2)));

        let storage = StorageConfig::from(&config);
        assert!(!storage.create_if_missing);
        assert!(!storage.sync_writes);
        assert_eq!(storage.lock_timeout, Some(Duration::from_secs(2)));
    }
}
