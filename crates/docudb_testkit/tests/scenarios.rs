//! End-to-end scenarios over a real store file.

use docudb_codec::CodecError;
use docudb_core::{
    CollectionModel, CoreError, Database, ErrorKind, RecordId, Schema, StorageError,
    StorageHandler,
};
use docudb_testkit::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

async fn saved(model: &CollectionModel, content: Value) -> RecordId {
    let mut record = model.new_record(&content).unwrap();
    record.save().await.unwrap();
    record.id().clone()
}

#[tokio::test]
async fn append_vectors_are_byte_exact() {
    for vector in frame_vectors() {
        let store = TestStore::new();
        let handler = store.handler().await;

        for record in &vector.records {
            handler.save(record).await.unwrap();
        }

        assert_eq!(store.raw(), vector.expected, "vector {}", vector.id);
        assert_eq!(
            handler.load_records().await.unwrap(),
            vector.records,
            "vector {}",
            vector.id
        );
    }
}

#[tokio::test]
async fn bare_files_accept_appends() {
    for bytes in bare_files() {
        let store = TestStore::new();
        store.write_raw(bytes);
        let handler = store.handler().await;

        handler.save("{}").await.unwrap();
        assert_eq!(store.raw(), b"[\r\n{}\r\n]");
    }
}

#[tokio::test]
async fn malformed_files_are_left_alone() {
    for bytes in malformed_files() {
        let store = TestStore::new();
        store.write_raw(bytes);
        let handler = store.handler().await;

        let err = handler.save("{}").await.unwrap_err();
        assert!(
            matches!(err, StorageError::Codec(CodecError::MalformedFrame { .. })),
            "{bytes:?}: {err}"
        );
        assert_eq!(store.raw(), bytes);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_record_creation_yields_distinct_ids() {
    let (_store, model) = TestStore::model(post_schema()).await;
    let model = Arc::new(model);

    let handles: Vec<_> = (0..64)
        .map(|n| {
            let model = Arc::clone(&model);
            tokio::spawn(async move {
                model
                    .new_record(&json!({ "title": format!("t{n}") }))
                    .unwrap()
                    .id()
                    .clone()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    let mut seeds = HashSet::new();
    for handle in handles {
        let id = handle.await.unwrap();
        seeds.insert(id.seed().unwrap());
        ids.insert(id);
    }

    assert_eq!(ids.len(), 64);
    assert_eq!(seeds, (0..64).collect());
}

#[tokio::test]
async fn save_then_find_returns_the_record() {
    let (_store, model) = TestStore::model(post_schema()).await;
    let mut record = model.new_record(&json!({"title": "A"})).unwrap();
    record.save().await.unwrap();

    let all = model.find().await.unwrap();
    assert_eq!(all, vec![record.to_json()]);
}

#[tokio::test]
async fn edit_then_save_replaces_the_record() {
    let (store, model) = TestStore::model(post_schema()).await;
    let mut record = model.new_record(&json!({"title": "A"})).unwrap();
    record.save().await.unwrap();
    let first_encoding = record.encode().unwrap();
    let first_updated = record.updated_at();

    record.edit(&json!({"title": "B"})).unwrap();
    record.save().await.unwrap();

    let all = model.find().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["_id"], json!(record.id().as_str()));
    assert_eq!(all[0]["title"], json!("B"));
    assert!(record.updated_at() >= first_updated);

    let raw = String::from_utf8(store.raw()).unwrap();
    assert!(!raw.contains(&first_encoding));
}

#[tokio::test]
async fn timestamps_scenario() {
    let (_store, model) = TestStore::model(post_schema()).await;

    let mut record = model.new_record(&json!({"title": "A"})).unwrap();
    record.save().await.unwrap();

    let all = model.find().await.unwrap();
    assert_eq!(all.len(), 1);
    let stored = all[0].as_object().unwrap();
    let keys: Vec<&str> = stored.keys().map(String::as_str).collect();
    assert_eq!(keys, ["_id", "title", "createdAt", "updatedAt"]);
    assert_eq!(stored["title"], json!("A"));
    assert_eq!(stored["createdAt"], stored["updatedAt"]);

    record.edit(&json!({"title": "B"})).unwrap();
    record.save().await.unwrap();

    let all = model.find().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["title"], json!("B"));

    let created = all[0]["createdAt"].as_str().unwrap();
    let updated = all[0]["updatedAt"].as_str().unwrap();
    assert!(
        docudb_core::timestamp::parse(updated) > docudb_core::timestamp::parse(created),
        "{updated} should be after {created}"
    );
}

#[tokio::test]
async fn find_by_id_and_delete_removes_only_matches() {
    let (_store, model) = TestStore::model(post_schema()).await;
    let a = saved(&model, json!({"title": "a"})).await;
    let b = saved(&model, json!({"title": "b"})).await;
    let c = saved(&model, json!({"title": "c"})).await;
    let d = saved(&model, json!({"title": "d"})).await;

    let before = model.storage().load_records().await.unwrap();
    let removed = model
        .find_by_id_and_delete(vec![d.as_str(), b.as_str()])
        .await
        .unwrap();

    let removed_ids: Vec<&str> = removed.iter().map(|r| r["_id"].as_str().unwrap()).collect();
    assert_eq!(removed_ids, [b.as_str(), d.as_str()]);

    let after = model.storage().load_records().await.unwrap();
    assert_eq!(after, vec![before[0].clone(), before[2].clone()]);

    let left: Vec<Value> = model.find_by_id([a.as_str(), c.as_str()]).await.unwrap();
    assert_eq!(left.len(), 2);
}

#[tokio::test]
async fn delete_all_empties_the_collection() {
    let (store, model) = TestStore::model(post_schema()).await;
    saved(&model, json!({"title": "a"})).await;
    saved(&model, json!({"title": "b"})).await;

    model.delete_all().await.unwrap();
    assert!(model.find().await.unwrap().is_empty());
    assert!(store.raw().is_empty());

    saved(&model, json!({"title": "c"})).await;
    assert_eq!(model.count().await.unwrap(), 1);
}

#[tokio::test]
async fn updated_record_moves_to_the_end() {
    let (_store, model) = TestStore::model(post_schema()).await;
    let mut first = model.new_record(&json!({"title": "first"})).unwrap();
    first.save().await.unwrap();
    saved(&model, json!({"title": "second"})).await;
    saved(&model, json!({"title": "third"})).await;

    first.edit(&json!({"title": "first, edited"})).unwrap();
    first.save().await.unwrap();

    let titles: Vec<Value> = model
        .find()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r["title"].clone())
        .collect();
    assert_eq!(titles, [json!("second"), json!("third"), json!("first, edited")]);
}

#[tokio::test]
async fn update_does_not_touch_records_embedding_the_id() {
    let (_store, model) = TestStore::model(kitchen_sink_schema()).await;
    let mut target = model.new_record(&json!({"name": "target"})).unwrap();
    target.save().await.unwrap();

    // Stored as `"meta":{"_id":"<target id>"}`, which contains the target's
    // quoted id field verbatim.
    saved(
        &model,
        json!({"name": "other", "meta": {"_id": target.id().as_str()}}),
    )
    .await;

    target.edit(&json!({"name": "target v2"})).unwrap();
    target.save().await.unwrap();

    let names: Vec<Value> = model
        .find()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r["name"].clone())
        .collect();
    assert_eq!(names, [json!("other"), json!("target v2")]);
}

#[tokio::test]
async fn literal_sentinel_and_newlines_survive() {
    let (_store, model) = TestStore::model(post_schema()).await;
    let title = "line one\r\nline two <|NEW-LINE|> still two";
    let id = saved(&model, json!({ "title": title })).await;

    let found = model.find_by_id(&id).await.unwrap();
    assert_eq!(found[0]["title"], json!(title));
}

#[tokio::test]
async fn corrupt_record_is_skipped_when_listing_documents() {
    let (_store, model) = TestStore::model(post_schema()).await;
    let good = saved(&model, json!({"title": "good"})).await;

    // Same id, but missing the required title.
    let broken = json!({
        "_id": good.as_str(),
        "createdAt": "2024-01-01T00:00:00.000Z"
    });
    model.storage().save(&broken.to_string()).await.unwrap();

    let docs = model.find_by_id_as_documents(&good).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].content()["title"], json!("good"));
}

#[tokio::test]
async fn disconnected_operations_report_connection_errors() {
    let model = CollectionModel::new(post_schema(), StorageHandler::new());
    let mut record = model.new_record(&json!({"title": "x"})).unwrap();

    let err = record.save().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert!(matches!(err, CoreError::Storage(StorageError::NotConnected)));

    assert_eq!(model.find().await.unwrap_err().kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn models_sharing_a_database_share_one_file() {
    let store = TestStore::new();
    let db: Database = store.database().await;
    let writer = db.model(post_schema());
    let reader = db.model(post_schema());

    let mut ids = Vec::new();
    for n in 0..8 {
        ids.push(saved(&writer, json!({ "title": format!("n{n}") })).await);
    }

    let found = reader.find_by_id(ids).await.unwrap();
    assert_eq!(found.len(), 8);
}

#[tokio::test]
async fn schema_errors_are_config_errors() {
    let err = Schema::new(&json!({"title": {"kind": "string"}}), &Value::Null).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn damaged_store_survives_bulk_operations() {
    let (store, model) = TestStore::model(post_schema()).await;
    let first = saved(&model, json!({"title": "first"})).await;
    saved(&model, json!({"title": "second"})).await;
    model.storage().save("{\"_id\":").await.unwrap();
    let before = store.raw();

    assert_eq!(model.find().await.unwrap_err().kind(), ErrorKind::Corruption);
    assert_eq!(model.pop_all().await.unwrap_err().kind(), ErrorKind::Corruption);
    assert_eq!(store.raw(), before);

    let removed = model.find_by_id_and_delete(&first).await.unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(model.count().await.unwrap(), 2);

    model.delete_all().await.unwrap();
    assert!(store.raw().is_empty());
}

#[tokio::test]
async fn hand_written_store_with_sentinel_is_readable() {
    let (store, model) = TestStore::model(post_schema()).await;
    store.write_raw(
        b"[\r\n{\"_id\":\"0-1700000000000-000000000000\",\"title\":\"one<|NEW-LINE|>two\",\
          \"createdAt\":\"2023-11-14T22:13:20.000Z\",\"updatedAt\":\"2023-11-14T22:13:20.000Z\"}\r\n]",
    );

    let found = model.find().await.unwrap();
    assert_eq!(found[0]["title"], json!("one\r\ntwo"));

    let mut docs = model
        .find_by_id_as_documents("0-1700000000000-000000000000")
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);

    docs[0].edit(&json!({"title": "three\r\nfour"})).unwrap();
    docs[0].save().await.unwrap();
    let text = String::from_utf8(store.raw()).unwrap();
    assert!(text.contains("three<|NEW-LINE|>four"), "{text}");
    assert!(!text.contains("one<|NEW-LINE|>two"));
}
