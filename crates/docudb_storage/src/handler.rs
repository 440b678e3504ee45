//! Store file handler.

use crate::config::StorageConfig;
use crate::error::{IoContext, StorageError, StorageResult};
use crate::lock::{LockRegistry, StoreLock};
use docudb_codec::{
    classify_tail, decode_record, encode_record, join_records, plan_append, restore_newlines,
    split_records, TAIL_LEN,
};
use std::fs::Metadata;
use std::future::Future;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, trace};

/// Extension every store file must carry.
pub const STORE_EXTENSION: &str = "json";

/// Owns the connection to one store file.
///
/// A store file holds a JSON array with one record per line (see
/// `docudb_codec`). The handler appends, rewrites and reads that file under a
/// reader/writer lock: any number of reads may run together, a write excludes
/// everything else, and access is granted in request order.
///
/// # Connection
///
/// A new handler is disconnected. [`connect`](Self::connect) validates the
/// path (creating an empty file if allowed) and records it; every other
/// operation fails fast with [`StorageError::NotConnected`] until then,
/// without touching the lock or the file.
///
/// # Copies
///
/// Cloning a handler copies its connection. The clone shares the store lock
/// with the original, and so does any handler connected to the same file
/// through the same [`LockRegistry`].
///
/// # Example
///
/// ```no_run
/// use docudb_storage::StorageHandler;
///
/// # async fn run() -> docudb_storage::StorageResult<()> {
/// let mut storage = StorageHandler::new();
/// storage.connect("users.json").await?;
///
/// storage.save(r#"{"_id":"0-1700000000000-00aa11bb22cc","name":"Ada"}"#).await?;
/// let records = storage.load_records().await?;
/// assert_eq!(records.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StorageHandler {
    path: Option<PathBuf>,
    lock: Option<StoreLock>,
    registry: Arc<LockRegistry>,
    config: StorageConfig,
}

impl Default for StorageHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageHandler {
    /// Creates a disconnected handler with its own lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Arc::new(LockRegistry::new()), StorageConfig::default())
    }

    /// Creates a disconnected handler with its own lock registry.
    #[must_use]
    pub fn with_config(config: StorageConfig) -> Self {
        Self::with_registry(Arc::new(LockRegistry::new()), config)
    }

    /// Creates a disconnected handler that takes its locks from `registry`.
    #[must_use]
    pub fn with_registry(registry: Arc<LockRegistry>, config: StorageConfig) -> Self {
        Self {
            path: None,
            lock: None,
            registry,
            config,
        }
    }

    /// Connects to the store file at `path`.
    ///
    /// A missing file is created empty when `create_if_missing` is set. On
    /// failure the handler is left disconnected.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidExtension`] if `path` does not end in `.json`
    /// - [`StorageError::NotFound`] if the file is missing and may not be created
    /// - [`StorageError::NotAFile`] if `path` is a directory or other non-file
    /// - [`StorageError::PermissionDenied`] if the file is not readable and writable
    pub async fn connect(&mut self, path: impl AsRef<Path>) -> StorageResult<()> {
        let path = path.as_ref();
        self.disconnect();

        if path.extension().and_then(|ext| ext.to_str()) != Some(STORE_EXTENSION) {
            return Err(StorageError::InvalidExtension {
                path: path.to_path_buf(),
            });
        }

        match fs::metadata(path).await {
            Ok(meta) => Self::check_existing(path, &meta).await?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.create_store(path).await?,
            Err(e) => return Err(open_error(path, e)),
        }

        let canonical = fs::canonicalize(path).await.during("connect")?;
        self.lock = Some(self.registry.lock_for(&canonical));
        debug!(path = %canonical.display(), "connected to store");
        self.path = Some(canonical);

        Ok(())
    }

    /// Drops the connection. Does nothing if already disconnected.
    pub fn disconnect(&mut self) {
        if let Some(path) = self.path.take() {
            debug!(path = %path.display(), "disconnected from store");
        }
        self.lock = None;
    }

    /// Returns true if the handler has an active connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.path.is_some()
    }

    /// Returns the canonical path of the connected store file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the handler configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the registry this handler takes its locks from.
    #[must_use]
    pub fn registry(&self) -> &Arc<LockRegistry> {
        &self.registry
    }

    /// Appends one record text to the store.
    ///
    /// Only the last few bytes of the file are rewritten, whatever its size.
    ///
    /// # Errors
    ///
    /// Fails if disconnected, if the file framing is broken, if `text` is
    /// empty, or on I/O failure.
    pub async fn save(&self, text: &str) -> StorageResult<()> {
        let (path, lock) = self.connection()?;
        let record = encode_record(text)?;

        let _guard = self.acquire("save", lock.write()).await?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .await
            .during("save")?;
        let size = file.metadata().await.during("save")?.len();
        let tail = read_tail(&mut file, size).await.during("save")?;

        let shape = classify_tail(size, &tail)?;
        let plan = plan_append(shape, size, &record)?;

        file.seek(SeekFrom::Start(plan.truncate_to))
            .await
            .during("save")?;
        file.write_all(&plan.bytes).await.during("save")?;
        file.flush().await.during("save")?;
        file.set_len(plan.truncate_to + plan.bytes.len() as u64)
            .await
            .during("save")?;
        self.sync(&file, "save").await?;

        trace!(?shape, bytes = plan.bytes.len(), "appended record");
        Ok(())
    }

    /// Replaces the whole store with `records`, in order.
    ///
    /// An empty slice leaves a bare `[` `]` frame.
    ///
    /// # Errors
    ///
    /// Fails if disconnected, if any record is empty, or on I/O failure.
    pub async fn overwrite<S: AsRef<str>>(&self, records: &[S]) -> StorageResult<()> {
        let (path, lock) = self.connection()?;
        let encoded = records
            .iter()
            .map(|record| encode_record(record.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let body = join_records(&encoded);

        let _guard = self.acquire("overwrite", lock.write()).await?;
        self.rewrite(path, body.as_bytes(), "overwrite").await?;

        debug!(records = encoded.len(), "overwrote store");
        Ok(())
    }

    /// Truncates the store to zero bytes.
    ///
    /// # Errors
    ///
    /// Fails if disconnected or on I/O failure.
    pub async fn erase_db(&self) -> StorageResult<()> {
        let (path, lock) = self.connection()?;

        let _guard = self.acquire("erase", lock.write()).await?;
        self.rewrite(path, b"", "erase").await?;

        debug!("erased store");
        Ok(())
    }

    /// Returns the full file text with newline sentinels restored.
    ///
    /// # Errors
    ///
    /// Fails if disconnected, if the file is not UTF-8, or on I/O failure.
    pub async fn load(&self) -> StorageResult<String> {
        let (path, lock) = self.connection()?;

        let _guard = self.acquire("load", lock.read()).await?;
        let body = read_body(path, "load").await?;

        Ok(restore_newlines(&body).into_owned())
    }

    /// Returns every record text in file order, newline sentinels restored.
    ///
    /// # Errors
    ///
    /// Fails if disconnected, if the framing is broken, or on I/O failure.
    pub async fn load_records(&self) -> StorageResult<Vec<String>> {
        let (path, lock) = self.connection()?;

        let _guard = self.acquire("load", lock.read()).await?;
        let body = read_body(path, "load").await?;

        Ok(split_records(&body)?
            .into_iter()
            .map(decode_record)
            .collect())
    }

    /// Removes every record whose text contains `pattern` as a literal substring.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Fails if disconnected, if the framing is broken, or on I/O failure.
    pub async fn delete_by_match(&self, pattern: &str) -> StorageResult<usize> {
        self.delete_where(|record| record.contains(pattern)).await
    }

    /// Removes every record for which `predicate` returns true.
    ///
    /// The predicate sees record texts with newline sentinels restored, once
    /// each and in file order, all under a single write lock. The file is only
    /// rewritten if at least one record is removed. Returns the number of
    /// records removed.
    ///
    /// # Errors
    ///
    /// Fails if disconnected, if the framing is broken, or on I/O failure.
    pub async fn delete_where<F>(&self, mut predicate: F) -> StorageResult<usize>
    where
        F: FnMut(&str) -> bool,
    {
        let (path, lock) = self.connection()?;

        let _guard = self.acquire("delete", lock.write()).await?;
        let body = read_body(path, "delete").await?;
        let stored = split_records(&body)?;

        let kept: Vec<&str> = stored
            .iter()
            .copied()
            .filter(|record| !predicate(&decode_record(record)))
            .collect();
        let removed = stored.len() - kept.len();

        if removed > 0 {
            self.rewrite(path, join_records(&kept).as_bytes(), "delete")
                .await?;
        }

        debug!(removed, kept = kept.len(), "deleted matching records");
        Ok(removed)
    }

    /// Removes and returns every record, leaving a zero-byte file.
    ///
    /// Reading and truncating happen under one write lock, so no record
    /// saved concurrently is lost between the two.
    ///
    /// # Errors
    ///
    /// Fails if disconnected, if the framing is broken, or on I/O failure.
    pub async fn drain(&self) -> StorageResult<Vec<String>> {
        self.drain_with(|record| Ok::<_, StorageError>(record.to_string()))
            .await
    }

    /// Like [`drain`](Self::drain), but converts each record with `parse`
    /// before the file is truncated.
    ///
    /// If any record fails to convert, the file is left untouched and the
    /// first error is returned.
    ///
    /// # Errors
    ///
    /// Fails if disconnected, if the framing is broken, on I/O failure, or
    /// with the error returned by `parse`.
    pub async fn drain_with<T, E, F>(&self, mut parse: F) -> Result<Vec<T>, E>
    where
        F: FnMut(&str) -> Result<T, E>,
        E: From<StorageError>,
    {
        let (path, lock) = self.connection()?;

        let _guard = self.acquire("drain", lock.write()).await?;
        let body = read_body(path, "drain").await?;
        let records = split_records(&body)
            .map_err(StorageError::from)?
            .into_iter()
            .map(|record| parse(&decode_record(record)))
            .collect::<Result<Vec<T>, E>>()?;
        self.rewrite(path, b"", "drain").await?;

        debug!(records = records.len(), "drained store");
        Ok(records)
    }

    /// Returns the current size of the store file in bytes.
    ///
    /// # Errors
    ///
    /// Fails if disconnected or on I/O failure.
    pub async fn size(&self) -> StorageResult<u64> {
        let (path, _) = self.connection()?;
        Ok(fs::metadata(path).await.during("size")?.len())
    }

    fn connection(&self) -> StorageResult<(&Path, &StoreLock)> {
        match (&self.path, &self.lock) {
            (Some(path), Some(lock)) => Ok((path, lock)),
            _ => Err(StorageError::NotConnected),
        }
    }

    async fn acquire<F: Future>(
        &self,
        operation: &'static str,
        guard: F,
    ) -> StorageResult<F::Output> {
        match self.config.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, guard)
                .await
                .map_err(|_| StorageError::LockTimeout { operation }),
            None => Ok(guard.await),
        }
    }

    async fn rewrite(&self, path: &Path, body: &[u8], operation: &'static str) -> StorageResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(path)
            .await
            .during(operation)?;
        file.write_all(body).await.during(operation)?;
        file.flush().await.during(operation)?;
        self.sync(&file, operation).await
    }

    async fn sync(&self, file: &File, operation: &'static str) -> StorageResult<()> {
        if self.config.sync_writes {
            file.sync_all().await.during(operation)?;
        }
        Ok(())
    }

    async fn check_existing(path: &Path, meta: &Metadata) -> StorageResult<()> {
        if !meta.is_file() {
            return Err(StorageError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        if meta.permissions().readonly() {
            return Err(StorageError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }

        OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .await
            .map_err(|e| open_error(path, e))?;
        Ok(())
    }

    async fn create_store(&self, path: &Path) -> StorageResult<()> {
        if !self.config.create_if_missing {
            return Err(StorageError::NotFound {
                path: path.to_path_buf(),
            });
        }

        match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .await
        {
            Ok(file) => {
                self.sync(&file, "connect").await?;
                debug!(path = %path.display(), "created empty store file");
                Ok(())
            }
            // Lost a creation race; the file exists now.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(open_error(path, e)),
        }
    }
}

fn open_error(path: &Path, source: io::Error) -> StorageError {
    match source.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => StorageError::Io {
            operation: "connect",
            source,
        },
    }
}

async fn read_tail(file: &mut File, size: u64) -> io::Result<Vec<u8>> {
    let len = size.min(TAIL_LEN);
    let mut tail = vec![0u8; len as usize];
    if len > 0 {
        file.seek(SeekFrom::Start(size - len)).await?;
        file.read_exact(&mut tail).await?;
    }
    Ok(tail)
}

async fn read_body(path: &Path, operation: &'static str) -> StorageResult<String> {
    let bytes = fs::read(path).await.during(operation)?;
    String::from_utf8(bytes).map_err(|_| StorageError::InvalidUtf8)
}
