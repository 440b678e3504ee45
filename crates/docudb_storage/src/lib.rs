//! # DocuDB Storage
//!
//! Store file handling for DocuDB.
//!
//! This crate owns the connection to a single store file and every byte
//! written to it. It treats records as opaque text: schemas, ids and
//! timestamps belong to `docudb_core`.
//!
//! ## Design Principles
//!
//! - One handler per store file, connected explicitly
//! - Appends rewrite a constant number of trailing bytes
//! - Reads share the store lock, writes hold it exclusively
//! - Lock access is granted in request order
//! - Handlers connected to the same file through one [`LockRegistry`] share
//!   a lock
//!
//! ## Example
//!
//! ```no_run
//! use docudb_storage::{StorageConfig, StorageHandler};
//! use std::time::Duration;
//!
//! # async fn run() -> docudb_storage::StorageResult<()> {
//! let config = StorageConfig::new().lock_timeout(Some(Duration::from_secs(5)));
//! let mut storage = StorageHandler::with_config(config);
//! storage.connect("notes.json").await?;
//!
//! storage.save(r#"{"title":"first"}"#).await?;
//! storage.delete_by_match("first").await?;
//! assert!(storage.load_records().await?.is_empty());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod handler;
mod lock;

pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use handler::{StorageHandler, STORE_EXTENSION};
pub use lock::{LockRegistry, StoreLock};
