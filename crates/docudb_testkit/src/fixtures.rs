//! Test fixtures and store helpers.
//!
//! Provides temporary store files that disappear with the fixture, plus a
//! few schemas shared by the tests.

use docudb_core::{CollectionModel, Config, Database, Schema};
use docudb_storage::StorageHandler;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary store file with automatic cleanup.
pub struct TestStore {
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestStore {
    /// Creates a fixture for `store.json` in a fresh temporary directory.
    ///
    /// The file itself is created by the first connect.
    pub fn new() -> Self {
        Self::named("store.json")
    }

    /// Creates a fixture for `name` in a fresh temporary directory.
    pub fn named(name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            path: temp_dir.path().join(name),
            _temp_dir: temp_dir,
        }
    }

    /// Returns the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the temporary directory.
    pub fn dir(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Returns a handler connected to the store file.
    pub async fn handler(&self) -> StorageHandler {
        let mut handler = StorageHandler::new();
        handler
            .connect(&self.path)
            .await
            .expect("Failed to connect to test store");
        handler
    }

    /// Returns a database connected to the store file.
    ///
    /// Syncing is disabled to keep tests fast.
    pub async fn database(&self) -> Database {
        Database::connect_with_config(&self.path, Config::new().sync_writes(false))
            .await
            .expect("Failed to connect test database")
    }

    /// Creates a fixture and a model over it.
    pub async fn model(schema: Schema) -> (Self, CollectionModel) {
        let store = Self::new();
        let model = store.database().await.model(schema);
        (store, model)
    }

    /// Returns the raw bytes of the store file.
    pub fn raw(&self) -> Vec<u8> {
        std::fs::read(&self.path).expect("Failed to read test store")
    }

    /// Replaces the raw bytes of the store file.
    pub fn write_raw(&self, bytes: &[u8]) {
        std::fs::write(&self.path, bytes).expect("Failed to write test store");
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `{title: required string}` with timestamps.
pub fn post_schema() -> Schema {
    Schema::new(
        &json!({"title": {"type": "string", "required": true}}),
        &json!({"timestamps": true}),
    )
    .expect("Invalid post schema")
}

/// A schema using every field type, without timestamps.
pub fn kitchen_sink_schema() -> Schema {
    Schema::new(
        &json!({
            "name": {"type": "string", "required": true},
            "label": {"type": "String", "default": "none"},
            "count": {"type": "number", "default": 0},
            "ratio": {"type": "Number"},
            "active": {"type": "boolean", "default": true},
            "flag": {"type": "Boolean"},
            "meta": {"type": "object"},
            "born": {"type": "Date"},
            "tags": {"type": "Array", "default": []}
        }),
        &json!({}),
    )
    .expect("Invalid kitchen sink schema")
}
