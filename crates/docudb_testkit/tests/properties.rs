//! Property tests across schema, codec and record encoding.

use docudb_codec::{
    decode_record, encode_record, join_records, split_records, NEWLINE_SENTINEL, SEPARATOR,
};
use docudb_core::{CoreError, DocumentRecord, Schema, StorageHandler};
use docudb_testkit::prelude::*;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

proptest! {
    #[test]
    fn copied_schema_validates_identically(
        (schema, content) in schema_and_content_strategy(),
        extra in hostile_text_strategy(),
    ) {
        let copy = schema.clone();
        prop_assert_eq!(&copy, &schema);

        prop_assert_eq!(
            copy.validate(&content).ok(),
            schema.validate(&content).ok()
        );

        let mut bad = content.clone();
        bad["__extra"] = Value::from(extra);
        prop_assert_eq!(copy.validate(&bad).ok(), schema.validate(&bad).ok());

        let empty = json!({});
        prop_assert_eq!(
            copy.validate(&empty).map_err(|e| e.to_string()),
            schema.validate(&empty).map_err(|e| e.to_string())
        );
    }

    #[test]
    fn rebuilt_schema_validates_identically((schema, content) in schema_and_content_strategy()) {
        let rebuilt = Schema::new(&schema.definition(), &schema.options().to_value()).unwrap();
        prop_assert_eq!(rebuilt.validate(&content).ok(), schema.validate(&content).ok());
    }

    #[test]
    fn validation_yields_exactly_declared_fields((schema, content) in schema_and_content_strategy()) {
        let validated = schema.validate(&content).unwrap();

        let declared: Vec<&str> = schema.fields().map(|(name, _)| name).collect();
        let produced: Vec<&str> = validated.keys().map(String::as_str).collect();
        prop_assert_eq!(produced, declared);

        for (name, spec) in schema.fields() {
            let expected = match content.get(name) {
                Some(value) if !value.is_null() => value,
                _ => spec.default().unwrap_or(&Value::Null),
            };
            prop_assert_eq!(&validated[name], expected);
        }
    }

    #[test]
    fn missing_required_field_is_rejected((schema, content) in schema_and_content_strategy()) {
        let required: Vec<String> = schema
            .fields()
            .filter(|(_, spec)| spec.is_required())
            .map(|(name, _)| name.to_string())
            .collect();

        for name in required {
            let mut partial = content.clone();
            partial.as_object_mut().unwrap().remove(&name);

            let err = schema.validate(&partial).unwrap_err();
            prop_assert!(
                matches!(err, CoreError::Validation { ref field, .. } if *field == name),
                "unexpected error {}", err
            );
        }
    }

    #[test]
    fn mistyped_field_is_rejected((schema, content) in schema_and_content_strategy()) {
        let (name, spec) = schema.fields().next().unwrap();
        // A nested array matches only `Array`.
        let wrong = if spec.field_type().matches(&json!([[0]])) {
            json!("not an array")
        } else {
            json!([[0]])
        };

        let mut bad = content.clone();
        bad[name] = wrong;
        let err = schema.validate(&bad).unwrap_err();
        let is_validation = matches!(err, CoreError::Validation { .. });
        prop_assert!(is_validation);
    }

    #[test]
    fn record_text_roundtrips(text in text_strategy()) {
        let raw = json!({ "t": text }).to_string();
        let stored = encode_record(&raw).unwrap();
        prop_assert!(!stored.contains(SEPARATOR));
        prop_assert_eq!(stored.contains(NEWLINE_SENTINEL), text.contains(SEPARATOR));

        let body = join_records(&[stored]);
        let records = split_records(&body).unwrap();
        prop_assert_eq!(records.len(), 1);
        prop_assert_eq!(decode_record(records[0]), raw);
    }

    #[test]
    fn record_content_roundtrips((schema, content) in schema_and_content_strategy()) {
        let schema = Arc::new(schema);
        let record =
            DocumentRecord::new(&content, Arc::clone(&schema), StorageHandler::new(), 0).unwrap();

        let stored = encode_record(&record.encode().unwrap()).unwrap();
        let body = join_records(&[stored]);
        let line = decode_record(split_records(&body).unwrap()[0]);

        let parsed: Value = serde_json::from_str(&line).unwrap();
        prop_assert_eq!(&parsed, &record.to_json());

        let rebuilt =
            DocumentRecord::reconstruct(&parsed, schema, StorageHandler::new(), true).unwrap();
        prop_assert_eq!(rebuilt.content(), record.content());
        prop_assert_eq!(rebuilt.id(), record.id());
    }
}
