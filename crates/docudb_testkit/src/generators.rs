//! Property-based test generators using proptest.
//!
//! Provides strategies for generating schemas, content that satisfies them,
//! and record texts full of the characters the store format has to escape.

use docudb_codec::NEWLINE_SENTINEL;
use docudb_core::{FieldSpec, FieldType, Schema};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for generating text that may contain CR LF pairs, lone CR or LF,
/// quotes, backslashes and non-ASCII characters, but never the newline
/// sentinel.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => "[a-zA-Z0-9 ]{0,8}",
            1 => Just("\r\n".to_string()),
            1 => Just("\n".to_string()),
            1 => Just("\r".to_string()),
            1 => Just("\"".to_string()),
            1 => Just("\\".to_string()),
            1 => Just(",".to_string()),
            1 => Just("]".to_string()),
            1 => Just("é✓".to_string()),
        ],
        0..8,
    )
    .prop_map(|parts| parts.concat())
}

/// Like [`text_strategy`], but may also contain the newline sentinel itself.
pub fn hostile_text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => text_strategy(),
            1 => Just(NEWLINE_SENTINEL.to_string()),
            1 => Just("<|NEW-LINE".to_string()),
        ],
        0..4,
    )
    .prop_map(|parts| parts.concat())
}

/// Strategy for generating field types.
pub fn field_type_strategy() -> impl Strategy<Value = FieldType> {
    prop::sample::select(FieldType::ALL.to_vec())
}

/// Strategy for generating RFC 3339 timestamps in the stored form.
pub fn date_strategy() -> impl Strategy<Value = String> {
    (1970u32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60, 0u32..1000).prop_map(
        |(y, mo, d, h, mi, s, ms)| format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}.{ms:03}Z"),
    )
}

fn number_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::from),
        // Quarters print and parse back exactly.
        (-4000i32..4000).prop_map(|n| Value::from(f64::from(n) / 4.0)),
    ]
}

/// Strategy for generating a value of type `field_type`.
pub fn value_strategy(field_type: FieldType) -> BoxedStrategy<Value> {
    match field_type {
        FieldType::String | FieldType::BoxedString => {
            hostile_text_strategy().prop_map(Value::from).boxed()
        }
        FieldType::Number | FieldType::BoxedNumber => number_strategy().boxed(),
        FieldType::Boolean | FieldType::BoxedBoolean => any::<bool>().prop_map(Value::from).boxed(),
        FieldType::Date => date_strategy().prop_map(Value::from).boxed(),
        FieldType::Array => prop::collection::vec(number_strategy(), 0..4)
            .prop_map(Value::Array)
            .boxed(),
        FieldType::Object => prop::collection::btree_map("[a-z]{1,5}", text_strategy(), 0..4)
            .prop_map(|entries| {
                Value::Object(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k, Value::from(v)))
                        .collect(),
                )
            })
            .boxed(),
    }
}

/// Strategy for generating a field declaration, with a well-typed default
/// half of the time.
pub fn field_spec_strategy() -> impl Strategy<Value = FieldSpec> {
    (field_type_strategy(), any::<bool>()).prop_flat_map(|(field_type, required)| {
        prop::option::of(value_strategy(field_type)).prop_map(move |default| {
            let spec = FieldSpec::new(field_type);
            let spec = if required { spec.required() } else { spec };
            match default {
                Some(value) => spec.default_value(value),
                None => spec,
            }
        })
    })
}

/// Strategy for generating valid schemas of one to six fields.
pub fn schema_strategy() -> impl Strategy<Value = Schema> {
    (
        prop::collection::btree_set("[a-z]{1,8}", 1..6),
        any::<bool>(),
    )
        .prop_flat_map(|(names, timestamps)| {
            let names: Vec<String> = names.into_iter().collect();
            let count = names.len();
            (
                Just(names),
                prop::collection::vec(field_spec_strategy(), count),
                Just(timestamps),
            )
        })
        .prop_map(|(names, specs, timestamps)| {
            names
                .into_iter()
                .zip(specs)
                .fold(Schema::builder(), |builder, (name, spec)| {
                    builder.field(name, spec)
                })
                .timestamps(timestamps)
                .build()
                .expect("Generated schema must be valid")
        })
}

/// Strategy for generating content that satisfies `schema`.
///
/// Required fields are always present; optional fields are present about
/// half of the time.
pub fn content_strategy(schema: &Schema) -> BoxedStrategy<Value> {
    let fields: Vec<BoxedStrategy<Option<(String, Value)>>> = schema
        .fields()
        .map(|(name, spec)| {
            let name = name.to_string();
            let value = value_strategy(spec.field_type());
            if spec.is_required() {
                value.prop_map(move |v| Some((name.clone(), v))).boxed()
            } else {
                prop::option::of(value)
                    .prop_map(move |v| v.map(|v| (name.clone(), v)))
                    .boxed()
            }
        })
        .collect();

    fields
        .prop_map(|entries| Value::Object(entries.into_iter().flatten().collect::<Map<_, _>>()))
        .boxed()
}

/// Strategy for generating a schema together with content satisfying it.
pub fn schema_and_content_strategy() -> impl Strategy<Value = (Schema, Value)> {
    schema_strategy().prop_flat_map(|schema| {
        let content = content_strategy(&schema);
        (Just(schema), content)
    })
}
