//! # DocuDB Core
//!
//! Schema-validated document store for DocuDB.
//!
//! This crate provides:
//! - [`Schema`]: typed field declarations with defaults, and validation
//! - [`DocumentRecord`]: one validated document with id and timestamps
//! - [`CollectionModel`]: record factory plus bulk lookups and deletes
//! - [`Database`]: explicit connection context shared by models
//!
//! Records live in a single `.json` store file per collection, managed by
//! `docudb_storage`.
//!
//! ## Example
//!
//! ```no_run
//! use docudb_core::{Database, Schema};
//! use serde_json::json;
//!
//! # async fn run() -> docudb_core::CoreResult<()> {
//! let db = Database::connect("notes.json").await?;
//! let notes = db.model(Schema::new(
//!     &json!({"title": {"type": "string", "required": true}}),
//!     &json!({"timestamps": true}),
//! )?);
//!
//! let mut note = notes.new_record(&json!({"title": "A"}))?;
//! note.save().await?;
//!
//! note.edit(&json!({"title": "B"}))?;
//! note.save().await?;
//!
//! let all = notes.find().await?;
//! assert_eq!(all[0]["title"], "B");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod id;
mod model;
mod record;
mod schema;
pub mod timestamp;

pub use config::Config;
pub use database::Database;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use id::{RecordId, RANDOM_HEX_LEN};
pub use model::{CollectionModel, IntoIds};
pub use record::{DocumentRecord, CREATED_AT_KEY, ID_KEY, UPDATED_AT_KEY};
pub use schema::{
    Content, FieldSpec, FieldType, Schema, SchemaBuilder, SchemaOptions, RESERVED_FIELDS,
};

pub use docudb_storage::{LockRegistry, StorageConfig, StorageError, StorageHandler};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
