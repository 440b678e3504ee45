//! Collection models.

use crate::error::{CoreError, CoreResult};
use crate::id::RecordId;
use crate::record::{DocumentRecord, ID_KEY};
use crate::schema::Schema;
use docudb_storage::{StorageError, StorageHandler};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// One or more record ids to look up.
///
/// Implemented for single ids (`&str`, `String`, `&RecordId`) and for
/// collections of them, so lookups accept either.
pub trait IntoIds {
    /// Collects the ids into a set.
    fn into_ids(self) -> HashSet<String>;
}

impl IntoIds for &str {
    fn into_ids(self) -> HashSet<String> {
        HashSet::from([self.to_string()])
    }
}

impl IntoIds for String {
    fn into_ids(self) -> HashSet<String> {
        HashSet::from([self])
    }
}

impl IntoIds for &RecordId {
    fn into_ids(self) -> HashSet<String> {
        HashSet::from([self.as_str().to_string()])
    }
}

impl<T: AsRef<str>> IntoIds for &[T] {
    fn into_ids(self) -> HashSet<String> {
        self.iter().map(|id| id.as_ref().to_string()).collect()
    }
}

impl<T: AsRef<str>, const N: usize> IntoIds for [T; N] {
    fn into_ids(self) -> HashSet<String> {
        self.iter().map(|id| id.as_ref().to_string()).collect()
    }
}

impl<T: AsRef<str>> IntoIds for Vec<T> {
    fn into_ids(self) -> HashSet<String> {
        self.iter().map(|id| id.as_ref().to_string()).collect()
    }
}

/// Binds a [`Schema`] to a [`StorageHandler`].
///
/// The model creates records, and runs the bulk reads and deletes that go
/// straight to storage. Every storage operation fails fast with a connection
/// error if the handler is disconnected, before touching the lock or the
/// file. Missing ids are never an error: lookups simply return fewer items.
///
/// # Example
///
/// ```no_run
/// use docudb_core::{Database, Schema};
/// use serde_json::json;
///
/// # async fn run() -> docudb_core::CoreResult<()> {
/// let db = Database::connect("todos.json").await?;
/// let todos = db.model(Schema::new(
///     &json!({"title": {"type": "string", "required": true}}),
///     &json!({"timestamps": true}),
/// )?);
///
/// let mut todo = todos.new_record(&json!({"title": "write docs"}))?;
/// todo.save().await?;
///
/// let found = todos.find_by_id(todo.id()).await?;
/// assert_eq!(found.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CollectionModel {
    schema: Arc<Schema>,
    storage: StorageHandler,
    counter: AtomicU64,
}

impl CollectionModel {
    /// Creates a model over `storage`.
    #[must_use]
    pub fn new(schema: Schema, storage: StorageHandler) -> Self {
        Self {
            schema: Arc::new(schema),
            storage,
            counter: AtomicU64::new(0),
        }
    }

    /// Creates an unsaved record from `content`.
    ///
    /// Each call takes the next seed from the model counter, so concurrent
    /// calls never share one. The counter advances even if validation fails.
    ///
    /// # Errors
    ///
    /// Fails if `content` does not satisfy the schema.
    pub fn new_record(&self, content: &Value) -> CoreResult<DocumentRecord> {
        let seed = self.counter.fetch_add(1, Ordering::Relaxed);
        DocumentRecord::new(
            content,
            Arc::clone(&self.schema),
            self.storage.clone(),
            seed,
        )
    }

    /// Returns every stored record, in file order.
    ///
    /// # Errors
    ///
    /// Fails if disconnected, on I/O failure, or if a stored record is not
    /// valid JSON.
    pub async fn find(&self) -> CoreResult<Vec<Value>> {
        self.ensure_connected()?;

        self.storage
            .load_records()
            .await?
            .iter()
            .map(|text| serde_json::from_str(text).map_err(CoreError::from))
            .collect()
    }

    /// Returns the stored records whose id is in `ids`, in file order.
    ///
    /// Records that cannot be parsed are skipped.
    ///
    /// # Errors
    ///
    /// Fails if disconnected or on I/O failure.
    pub async fn find_by_id(&self, ids: impl IntoIds) -> CoreResult<Vec<Value>> {
        self.ensure_connected()?;
        let ids = ids.into_ids();

        Ok(self
            .storage
            .load_records()
            .await?
            .iter()
            .filter_map(|text| parse_stored(text))
            .filter(|value| stored_id(value).is_some_and(|id| ids.contains(id)))
            .collect())
    }

    /// Like [`find_by_id`](Self::find_by_id), rebuilding each match into a
    /// persisted [`DocumentRecord`]. Matches that fail to rebuild are skipped.
    ///
    /// # Errors
    ///
    /// Fails if disconnected or on I/O failure.
    pub async fn find_by_id_as_documents(
        &self,
        ids: impl IntoIds,
    ) -> CoreResult<Vec<DocumentRecord>> {
        let found = self.find_by_id(ids).await?;
        Ok(self.rebuild(&found, true))
    }

    /// Removes the stored records whose id is in `ids` and returns them.
    ///
    /// Every other record keeps its exact stored text and position. The file
    /// is left untouched if nothing matches.
    ///
    /// # Errors
    ///
    /// Fails if disconnected or on I/O failure.
    pub async fn find_by_id_and_delete(&self, ids: impl IntoIds) -> CoreResult<Vec<Value>> {
        self.ensure_connected()?;
        let ids = ids.into_ids();

        let mut removed = Vec::new();
        self.storage
            .delete_where(|text| match parse_stored(text) {
                Some(value) if stored_id(&value).is_some_and(|id| ids.contains(id)) => {
                    removed.push(value);
                    true
                }
                _ => false,
            })
            .await?;

        debug!(requested = ids.len(), removed = removed.len(), "deleted records by id");
        Ok(removed)
    }

    /// Like [`find_by_id_and_delete`](Self::find_by_id_and_delete), rebuilding
    /// each removed record into an unsaved [`DocumentRecord`].
    ///
    /// Saving a returned record stores it again as a new entry.
    ///
    /// # Errors
    ///
    /// Fails if disconnected or on I/O failure.
    pub async fn find_by_id_and_delete_as_documents(
        &self,
        ids: impl IntoIds,
    ) -> CoreResult<Vec<DocumentRecord>> {
        let removed = self.find_by_id_and_delete(ids).await?;
        Ok(self.rebuild(&removed, false))
    }

    /// Removes every record, leaving a zero-byte store.
    ///
    /// # Errors
    ///
    /// Fails if disconnected or on I/O failure.
    pub async fn delete_all(&self) -> CoreResult<()> {
        self.ensure_connected()?;
        self.storage.erase_db().await?;
        Ok(())
    }

    /// Removes every record and returns what was stored.
    ///
    /// # Errors
    ///
    /// Fails if disconnected, on I/O failure, or if a stored record is not
    /// valid JSON. On failure the store is left as it was.
    pub async fn pop_all(&self) -> CoreResult<Vec<Value>> {
        self.ensure_connected()?;

        self.storage
            .drain_with(|text| serde_json::from_str(text).map_err(CoreError::from))
            .await
    }

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Fails if disconnected or on I/O failure.
    pub async fn count(&self) -> CoreResult<usize> {
        self.ensure_connected()?;
        Ok(self.storage.load_records().await?.len())
    }

    /// Returns the model schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the model storage.
    #[must_use]
    pub fn storage(&self) -> &StorageHandler {
        &self.storage
    }

    fn ensure_connected(&self) -> CoreResult<()> {
        if self.storage.is_connected() {
            Ok(())
        } else {
            Err(StorageError::NotConnected.into())
        }
    }

    fn rebuild(&self, values: &[Value], persisted: bool) -> Vec<DocumentRecord> {
        values
            .iter()
            .filter_map(|value| {
                DocumentRecord::reconstruct(
                    value,
                    Arc::clone(&self.schema),
                    self.storage.clone(),
                    persisted,
                )
            })
            .collect()
    }
}

fn parse_stored(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

fn stored_id(value: &Value) -> Option<&str> {
    value.get(ID_KEY).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    fn schema() -> Schema {
        Schema::new(
            &json!({
                "name": {"type": "string", "required": true},
                "age": {"type": "number"}
            }),
            &json!({"timestamps": true}),
        )
        .unwrap()
    }

    async fn model() -> (TempDir, CollectionModel) {
        let dir = tempdir().unwrap();
        let mut storage = StorageHandler::new();
        storage.connect(dir.path().join("people.json")).await.unwrap();
        (dir, CollectionModel::new(schema(), storage))
    }

    async fn seed(model: &CollectionModel, names: &[&str]) -> Vec<RecordId> {
        let mut ids = Vec::new();
        for name in names {
            let mut record = model.new_record(&json!({ "name": name })).unwrap();
            record.save().await.unwrap();
            ids.push(record.id().clone());
        }
        ids
    }

    fn names(values: &[Value]) -> Vec<&str> {
        values.iter().map(|v| v["name"].as_str().unwrap()).collect()
    }

    #[test]
    fn ids_into_sets() {
        assert_eq!("a".into_ids().len(), 1);
        assert_eq!(String::from("a").into_ids().len(), 1);
        assert_eq!(["a", "b", "a"].into_ids().len(), 2);
        assert_eq!(vec!["a".to_string()].into_ids().len(), 1);
        assert_eq!((&["a", "b"][..]).into_ids().len(), 2);
    }

    #[test]
    fn seeds_advance_even_on_failure() {
        let model = CollectionModel::new(schema(), StorageHandler::new());

        let first = model.new_record(&json!({"name": "a"})).unwrap();
        assert!(model.new_record(&json!({"age": 3})).is_err());
        let third = model.new_record(&json!({"name": "c"})).unwrap();

        assert_eq!(first.id().seed(), Some(0));
        assert_eq!(third.id().seed(), Some(2));
    }

    #[tokio::test]
    async fn disconnected_model_fails_fast() {
        let model = CollectionModel::new(schema(), StorageHandler::new());

        assert_eq!(model.find().await.unwrap_err().kind(), ErrorKind::Connection);
        assert_eq!(
            model.find_by_id("x").await.unwrap_err().kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            model.find_by_id_and_delete("x").await.unwrap_err().kind(),
            ErrorKind::Connection
        );
        assert_eq!(model.delete_all().await.unwrap_err().kind(), ErrorKind::Connection);
        assert_eq!(model.pop_all().await.unwrap_err().kind(), ErrorKind::Connection);
        assert_eq!(model.count().await.unwrap_err().kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn find_returns_file_order() {
        let (_dir, model) = model().await;
        seed(&model, &["ann", "bob", "cat"]).await;

        let all = model.find().await.unwrap();
        assert_eq!(names(&all), ["ann", "bob", "cat"]);
        assert_eq!(model.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn find_by_id_ignores_argument_order_and_missing_ids() {
        let (_dir, model) = model().await;
        let ids = seed(&model, &["ann", "bob", "cat"]).await;

        let found = model
            .find_by_id([ids[2].as_str(), "0-0-000000000000", ids[0].as_str()])
            .await
            .unwrap();
        assert_eq!(names(&found), ["ann", "cat"]);

        assert!(model.find_by_id("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_by_id_as_documents_are_persisted() {
        let (_dir, model) = model().await;
        let ids = seed(&model, &["ann"]).await;

        let docs = model.find_by_id_as_documents(&ids[0]).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].is_persisted());
        assert_eq!(docs[0].id(), &ids[0]);
    }

    #[tokio::test]
    async fn rebuilt_document_update_moves_to_end() {
        let (_dir, model) = model().await;
        let ids = seed(&model, &["ann", "bob"]).await;

        let mut docs = model.find_by_id_as_documents(&ids[0]).await.unwrap();
        docs[0].edit(&json!({"name": "anne"})).unwrap();
        docs[0].save().await.unwrap();

        assert_eq!(names(&model.find().await.unwrap()), ["bob", "anne"]);
    }

    #[tokio::test]
    async fn find_by_id_and_delete_keeps_others_byte_identical() {
        let (_dir, model) = model().await;
        let ids = seed(&model, &["ann", "bob", "cat"]).await;

        let before = model.storage().load_records().await.unwrap();
        let removed = model.find_by_id_and_delete(&ids[1]).await.unwrap();
        assert_eq!(names(&removed), ["bob"]);

        let after = model.storage().load_records().await.unwrap();
        assert_eq!(after, vec![before[0].clone(), before[2].clone()]);
    }

    #[tokio::test]
    async fn deleted_documents_resave_as_new_entries() {
        let (_dir, model) = model().await;
        let ids = seed(&model, &["ann", "bob"]).await;

        let mut removed = model
            .find_by_id_and_delete_as_documents(vec![ids[0].as_str()])
            .await
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert!(!removed[0].is_persisted());

        removed[0].save().await.unwrap();
        assert_eq!(names(&model.find().await.unwrap()), ["bob", "ann"]);
    }

    #[tokio::test]
    async fn delete_all_and_pop_all() {
        let (_dir, model) = model().await;
        seed(&model, &["ann", "bob"]).await;

        let popped = model.pop_all().await.unwrap();
        assert_eq!(names(&popped), ["ann", "bob"]);
        assert!(model.find().await.unwrap().is_empty());

        seed(&model, &["cat"]).await;
        model.delete_all().await.unwrap();
        assert!(model.find().await.unwrap().is_empty());
        assert_eq!(model.storage().size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_reports_corrupt_records() {
        let (_dir, model) = model().await;
        seed(&model, &["ann"]).await;
        model.storage().save("{not json").await.unwrap();

        let err = model.find().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corruption);

        // Lookups skip the damaged line instead.
        assert_eq!(model.find_by_id("x").await.unwrap().len(), 0);
        let ids: Vec<String> = Vec::new();
        assert!(model.find_by_id(ids).await.unwrap().is_empty());
    }

    async fn seed_with_damage(model: &CollectionModel) -> Vec<RecordId> {
        let ids = seed(model, &["ann", "bob"]).await;
        model.storage().save("{garbage").await.unwrap();
        ids
    }

    async fn raw(model: &CollectionModel) -> Vec<u8> {
        tokio::fs::read(model.storage().path().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn pop_all_on_damaged_store_keeps_every_byte() {
        let (_dir, model) = model().await;
        seed_with_damage(&model).await;
        let before = raw(&model).await;

        let err = model.pop_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corruption);
        assert_eq!(raw(&model).await, before);
        assert_eq!(model.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn find_on_damaged_store_changes_nothing() {
        let (_dir, model) = model().await;
        seed_with_damage(&model).await;
        let before = raw(&model).await;

        assert_eq!(model.find().await.unwrap_err().kind(), ErrorKind::Corruption);
        assert_eq!(raw(&model).await, before);
    }

    #[tokio::test]
    async fn delete_by_id_on_damaged_store_keeps_the_damaged_line() {
        let (_dir, model) = model().await;
        let ids = seed_with_damage(&model).await;

        let removed = model.find_by_id_and_delete(&ids[0]).await.unwrap();
        assert_eq!(names(&removed), ["ann"]);

        let lines = model.storage().load_records().await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("bob"));
        assert_eq!(lines[1], "{garbage");

        // A missing id leaves the file as it is.
        let before = raw(&model).await;
        assert!(model.find_by_id_and_delete("0-0-000000000000").await.unwrap().is_empty());
        assert_eq!(raw(&model).await, before);
    }

    #[tokio::test]
    async fn newline_in_a_field_is_stored_as_the_sentinel() {
        let (_dir, model) = model().await;
        let mut record = model.new_record(&json!({"name": "one\r\ntwo"})).unwrap();
        record.save().await.unwrap();

        let text = String::from_utf8(raw(&model).await).unwrap();
        assert!(text.contains(r#""name":"one<|NEW-LINE|>two""#), "{text}");
        assert_eq!(text.matches("\r\n").count(), 2);

        assert_eq!(model.find().await.unwrap()[0]["name"], json!("one\r\ntwo"));
    }

    #[tokio::test]
    async fn find_reads_a_hand_written_store() {
        let (_dir, model) = model().await;
        tokio::fs::write(
            model.storage().path().unwrap(),
            "[\r\n{\"_id\":\"0-1700000000000-000000000000\",\"name\":\"one<|NEW-LINE|>two\",\"createdAt\":\"2023-11-14T22:13:20.000Z\"},\r\n{\"_id\":\"1-1700000000001-000000000000\",\"name\":\"three\"}\r\n]",
        )
        .await
        .unwrap();

        let all = model.find().await.unwrap();
        assert_eq!(names(&all), ["one\r\ntwo", "three"]);

        let docs = model
            .find_by_id_as_documents("0-1700000000000-000000000000")
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content()["name"], json!("one\r\ntwo"));
    }
}
