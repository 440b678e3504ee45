//! Document records.

use crate::error::{CoreError, CoreResult};
use crate::id::RecordId;
use crate::schema::{Content, Schema};
use crate::timestamp;
use chrono::{DateTime, Utc};
use docudb_codec::NEWLINE_SENTINEL;
use docudb_storage::{StorageError, StorageHandler};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Stored key of the record id.
pub const ID_KEY: &str = "_id";
/// Stored key of the creation timestamp.
pub const CREATED_AT_KEY: &str = "createdAt";
/// Stored key of the last-update timestamp.
pub const UPDATED_AT_KEY: &str = "updatedAt";

/// JSON escape of the sentinel's first character, so stored text never
/// contains the sentinel verbatim.
const ESCAPED_SENTINEL: &str = "\\u003c|NEW-LINE|>";

/// One validated document.
///
/// A record owns its id, its content (exactly the schema's declared fields)
/// and its timestamps, and writes itself through a [`StorageHandler`]. It is
/// created fresh by [`crate::CollectionModel::new_record`] or rebuilt from
/// stored text by [`DocumentRecord::reconstruct`].
///
/// Records are stored as
/// `{"_id": ..., <fields in declaration order>, "createdAt": ..., "updatedAt": ...}`;
/// the timestamps appear only when the schema enables them or the source
/// content supplied them.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    id: RecordId,
    content: Content,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    persisted: bool,
    schema: Arc<Schema>,
    storage: StorageHandler,
}

impl DocumentRecord {
    /// Builds a record from `content`.
    ///
    /// A valid `_id`, `createdAt` or `updatedAt` carried by `content` is
    /// adopted; otherwise the id is minted from `seed` and, if the schema
    /// enables timestamps, both timestamps are set to now.
    ///
    /// # Errors
    ///
    /// Fails if `content` does not satisfy the schema.
    pub fn new(
        content: &Value,
        schema: Arc<Schema>,
        storage: StorageHandler,
        seed: u64,
    ) -> CoreResult<Self> {
        let validated = schema.validate(content)?;

        let id = meta_str(content, ID_KEY)
            .and_then(RecordId::parse)
            .unwrap_or_else(|| RecordId::mint(seed));
        let mut created_at = meta_time(content, CREATED_AT_KEY);
        let mut updated_at = meta_time(content, UPDATED_AT_KEY);

        if schema.timestamps() {
            let now = timestamp::now();
            created_at = created_at.or(Some(now));
            updated_at = updated_at.or(created_at);
        }

        Ok(Self {
            id,
            content: validated,
            created_at,
            updated_at,
            persisted: false,
            schema,
            storage,
        })
    }

    /// Rebuilds a record from stored content.
    ///
    /// Unlike [`new`](Self::new), nothing is minted: the content must carry a
    /// valid `_id`, and a `createdAt` strictly before the current instant
    /// (required when the schema enables timestamps). On any problem the record is skipped
    /// with a warning and `None` is returned, so one damaged entry cannot
    /// abort a listing.
    #[must_use]
    pub fn reconstruct(
        content: &Value,
        schema: Arc<Schema>,
        storage: StorageHandler,
        was_saved: bool,
    ) -> Option<Self> {
        match Self::try_reconstruct(content, schema, storage, was_saved, Utc::now()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    id = meta_str(content, ID_KEY).unwrap_or("<none>"),
                    error = %e,
                    "skipping malformed stored record"
                );
                None
            }
        }
    }

    fn try_reconstruct(
        content: &Value,
        schema: Arc<Schema>,
        storage: StorageHandler,
        was_saved: bool,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let id = match meta_str(content, ID_KEY) {
            Some(text) => RecordId::parse(text)
                .ok_or_else(|| CoreError::invalid_record(format!("malformed id `{text}`")))?,
            None => return Err(CoreError::invalid_record("missing `_id`")),
        };

        let validated = schema.validate(content)?;

        let created_at = meta_timestamp(content, CREATED_AT_KEY)?;
        match created_at {
            Some(created) if created >= now => {
                return Err(CoreError::invalid_record(format!(
                    "`createdAt` {} is not in the past",
                    timestamp::format(&created)
                )))
            }
            None if schema.timestamps() => {
                return Err(CoreError::invalid_record("missing `createdAt`"))
            }
            _ => {}
        }

        let updated_at = meta_timestamp(content, UPDATED_AT_KEY)?.or(created_at);

        Ok(Self {
            id,
            content: validated,
            created_at,
            updated_at,
            persisted: was_saved,
            schema,
            storage,
        })
    }

    /// Replaces the content after validating `content`.
    ///
    /// On success `updatedAt` moves strictly forward (when the record carries
    /// timestamps). On failure the record is left unchanged.
    ///
    /// # Errors
    ///
    /// Fails if `content` does not satisfy the schema.
    pub fn edit(&mut self, content: &Value) -> CoreResult<()> {
        let validated = self.schema.validate(content)?;

        self.content = validated;
        if self.schema.timestamps() || self.updated_at.is_some() {
            self.updated_at = Some(timestamp::advance(self.updated_at));
        }
        Ok(())
    }

    /// Writes the record to storage.
    ///
    /// A record never saved before is appended. A persisted record first has
    /// its previous line removed (matched on the exact leading `_id` field),
    /// then the new text is appended, so an updated record moves to the end
    /// of the file. If the removal fails nothing is appended.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the storage is not connected, or any
    /// storage error from the removal or the append.
    pub async fn save(&mut self) -> CoreResult<()> {
        if !self.storage.is_connected() {
            return Err(StorageError::NotConnected.into());
        }

        let text = self.encode()?;

        if self.persisted {
            let prefix = self.line_prefix()?;
            let removed = self
                .storage
                .delete_where(|line| line.starts_with(&prefix))
                .await?;
            debug!(id = %self.id, removed, "removed previous record version");
        }

        self.storage.save(&text).await?;
        self.persisted = true;

        debug!(id = %self.id, "saved record");
        Ok(())
    }

    /// Returns the record in its stored JSON shape.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Content::new();
        object.insert(ID_KEY.to_string(), Value::from(self.id.as_str()));
        object.extend(self.content.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(created) = &self.created_at {
            object.insert(CREATED_AT_KEY.to_string(), timestamp::format(created).into());
        }
        if let Some(updated) = &self.updated_at {
            object.insert(UPDATED_AT_KEY.to_string(), timestamp::format(updated).into());
        }
        Value::Object(object)
    }

    /// Serializes the record to its single-line stored text.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn encode(&self) -> CoreResult<String> {
        let text = serde_json::to_string(&self.to_json())?;
        Ok(text.replace(NEWLINE_SENTINEL, ESCAPED_SENTINEL))
    }

    /// Every stored line of this record starts with this text.
    fn line_prefix(&self) -> CoreResult<String> {
        Ok(format!(
            "{{{}:{}",
            serde_json::to_string(ID_KEY)?,
            serde_json::to_string(self.id.as_str())?
        ))
    }

    /// Returns the record id.
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Returns the validated content.
    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Returns the creation time.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns the last update time.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns true if this record is known to be in storage.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Returns the record's schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the storage the record saves to.
    #[must_use]
    pub fn storage(&self) -> &StorageHandler {
        &self.storage
    }
}

fn meta_str<'a>(content: &'a Value, key: &str) -> Option<&'a str> {
    content.get(key).and_then(Value::as_str)
}

fn meta_time(content: &Value, key: &str) -> Option<DateTime<Utc>> {
    meta_str(content, key).and_then(timestamp::parse)
}

/// Like [`meta_time`], but a present value that is not a timestamp is an error.
fn meta_timestamp(content: &Value, key: &str) -> CoreResult<Option<DateTime<Utc>>> {
    match content.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .and_then(timestamp::parse)
            .map(Some)
            .ok_or_else(|| CoreError::invalid_record(format!("malformed `{key}`"))),
    }
}
