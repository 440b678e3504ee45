//! Path-keyed store locks.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;

/// The lock guarding one store file.
///
/// `tokio::sync::RwLock` is fair: waiters are granted access in the order
/// they asked for it, and a queued writer blocks later readers.
pub type StoreLock = Arc<RwLock<()>>;

/// Hands out one [`StoreLock`] per store path.
///
/// Every handler connected through the same registry to the same path gets
/// the same lock, so copies of a handler exclude each other. Entries are held
/// weakly and disappear once no handler uses them.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<PathBuf, Weak<RwLock<()>>>>,
}

impl LockRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `path`, creating it if no live handler holds one.
    ///
    /// `path` should be canonical so that different spellings of one file
    /// share a lock.
    pub fn lock_for(&self, path: &Path) -> StoreLock {
        let mut locks = self.locks.lock();
        locks.retain(|_, lock| lock.strong_count() > 0);

        if let Some(lock) = locks.get(path).and_then(Weak::upgrade) {
            return lock;
        }

        let lock = Arc::new(RwLock::new(()));
        locks.insert(path.to_path_buf(), Arc::downgrade(&lock));
        lock
    }

    /// Returns the number of paths with a live lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }

    /// Returns true if no path has a live lock.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
