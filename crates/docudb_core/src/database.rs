//! Database context.

use crate::config::Config;
use crate::error::CoreResult;
use crate::model::CollectionModel;
use crate::schema::Schema;
use docudb_storage::{LockRegistry, StorageHandler};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Connection context for DocuDB stores.
///
/// A `Database` holds one store connection and the lock registry every
/// handler it creates draws from. Models are built from it explicitly, so
/// there is no process-wide connection state: two databases connected to
/// different files are fully independent.
///
/// Handlers created through one `Database` (its own, those of its models and
/// those returned by [`open_model`](Self::open_model)) share one lock per
/// store file.
///
/// # Example
///
/// ```no_run
/// use docudb_core::{Config, Database, Schema};
/// use serde_json::json;
///
/// # async fn run() -> docudb_core::CoreResult<()> {
/// let config = Config::new().sync_writes(false);
/// let db = Database::connect_with_config("posts.json", config).await?;
///
/// let posts = db.model(Schema::new(
///     &json!({"title": {"type": "string", "required": true}}),
///     &serde_json::Value::Null,
/// )?);
/// posts.new_record(&json!({"title": "hello"}))?.save().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Database {
    config: Config,
    registry: Arc<LockRegistry>,
    storage: StorageHandler,
}

impl Database {
    /// Creates a disconnected database with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a disconnected database.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let registry = Arc::new(LockRegistry::new());
        let storage = StorageHandler::with_registry(Arc::clone(&registry), config.storage_config());
        Self {
            config,
            registry,
            storage,
        }
    }

    /// Connects to the store file at `path` with default configuration.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the path is not a usable `.json` file.
    pub async fn connect(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::connect_with_config(path, Config::default()).await
    }

    /// Connects to the store file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the path is not a usable `.json` file.
    pub async fn connect_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let mut db = Self::with_config(config);
        db.reconnect(path).await?;
        Ok(db)
    }

    /// Points the database at another store file.
    ///
    /// Models built earlier keep their own connection.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the path is not a usable `.json` file.
    /// The database is disconnected in that case.
    pub async fn reconnect(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        self.storage.connect(path).await?;
        if let Some(path) = self.storage.path() {
            info!(path = %path.display(), "database connected");
        }
        Ok(())
    }

    /// Builds a model over this database's store.
    ///
    /// The model gets its own copy of the connection; disconnecting the
    /// database later does not disconnect it.
    #[must_use]
    pub fn model(&self, schema: Schema) -> CollectionModel {
        CollectionModel::new(schema, self.storage.clone())
    }

    /// Connects a new handler to `path` and builds a model over it.
    ///
    /// Useful for keeping one store file per collection.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the path is not a usable `.json` file.
    pub async fn open_model(
        &self,
        path: impl AsRef<Path>,
        schema: Schema,
    ) -> CoreResult<CollectionModel> {
        let mut storage = self.handler();
        storage.connect(path).await?;
        Ok(CollectionModel::new(schema, storage))
    }

    /// Returns a disconnected handler sharing this database's configuration
    /// and lock registry.
    #[must_use]
    pub fn handler(&self) -> StorageHandler {
        StorageHandler::with_registry(Arc::clone(&self.registry), self.config.storage_config())
    }

    /// Returns the database's own storage handler.
    #[must_use]
    pub fn storage(&self) -> &StorageHandler {
        &self.storage
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the path of the connected store file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.storage.path()
    }

    /// Drops the connection.
    pub fn disconnect(&mut self) {
        self.storage.disconnect();
    }

    /// Returns true if the database is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.storage.is_connected()
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
