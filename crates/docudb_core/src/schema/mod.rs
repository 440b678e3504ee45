//! Schema definition and validation.
//!
//! A [`Schema`] declares the fields a record carries, each with a type, a
//! required flag and an optional default, plus [`SchemaOptions`] for the
//! collection. Validation never mutates its input: it builds a new content
//! map holding exactly the declared fields, in declaration order.

mod field;
mod options;

pub use field::{FieldSpec, FieldType};
pub use options::SchemaOptions;

use crate::error::{CoreError, CoreResult};
use field::value_kind;
use serde_json::{Map, Value};

/// Record content: field name to value, in declaration order.
pub type Content = Map<String, Value>;

/// Field names reserved for record metadata.
pub const RESERVED_FIELDS: [&str; 3] = ["_id", "createdAt", "updatedAt"];

/// A compiled record schema.
///
/// Schemas are immutable once built, except for [`set_options`](Self::set_options).
/// [`Clone`] produces a fully independent copy.
///
/// # Example
///
/// ```
/// use docudb_core::Schema;
/// use serde_json::json;
///
/// let schema = Schema::new(
///     &json!({
///         "title": {"type": "string", "required": true},
///         "votes": {"type": "number", "default": 0}
///     }),
///     &json!({"timestamps": true}),
/// )
/// .unwrap();
///
/// let content = schema.validate(&json!({"title": "Hello"})).unwrap();
/// assert_eq!(content["votes"], json!(0));
///
/// assert!(schema.validate(&json!({"votes": 3})).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
    options: SchemaOptions,
}

impl Schema {
    /// Compiles a schema from its JSON definition and options.
    ///
    /// `definition` maps field names to declarations (see
    /// [`FieldSpec::from_value`]). `options` may be `null`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the definition is not a non-empty
    /// object, names a reserved field, holds a malformed declaration, or if
    /// the options are malformed.
    pub fn new(definition: &Value, options: &Value) -> CoreResult<Self> {
        let declarations = definition
            .as_object()
            .ok_or_else(|| CoreError::config("schema definition must be an object"))?;

        let fields = declarations
            .iter()
            .map(|(name, declaration)| {
                FieldSpec::from_value(name, declaration).map(|spec| (name.clone(), spec))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Self::from_parts(fields, SchemaOptions::from_value(options)?)
    }

    /// Starts building a schema field by field.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    fn from_parts(fields: Vec<(String, FieldSpec)>, options: SchemaOptions) -> CoreResult<Self> {
        if fields.is_empty() {
            return Err(CoreError::config("schema definition is empty"));
        }

        for (i, (name, spec)) in fields.iter().enumerate() {
            if RESERVED_FIELDS.contains(&name.as_str()) {
                return Err(CoreError::config(format!(
                    "field name `{name}` is reserved for record metadata"
                )));
            }
            if fields[..i].iter().any(|(other, _)| other == name) {
                return Err(CoreError::config(format!("field `{name}` is declared twice")));
            }
            spec.check(name)?;
        }

        Ok(Self { fields, options })
    }

    /// Validates `content` against the schema.
    ///
    /// Returns a new map with exactly the declared fields: present values are
    /// copied, absent optional fields take their default (or `null` when none
    /// is declared), undeclared keys are dropped. A `null` value counts as
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidContent`] if `content` is not an object and
    /// [`CoreError::Validation`] for the first missing required field or
    /// mistyped value.
    pub fn validate(&self, content: &Value) -> CoreResult<Content> {
        let input = content.as_object().ok_or_else(|| {
            CoreError::invalid_content(format!(
                "content must be an object, got {}",
                value_kind(content)
            ))
        })?;

        let mut output = Content::new();
        for (name, spec) in &self.fields {
            let value = match input.get(name).filter(|v| !v.is_null()) {
                Some(value) if spec.field_type().matches(value) => value.clone(),
                Some(value) => {
                    return Err(CoreError::validation(
                        name,
                        format!(
                            "expected {}, got {}",
                            spec.field_type(),
                            value_kind(value)
                        ),
                    ))
                }
                None if spec.is_required() => {
                    return Err(CoreError::validation(name, "field is required"))
                }
                None => spec.default().cloned().unwrap_or(Value::Null),
            };
            output.insert(name.clone(), value);
        }

        Ok(output)
    }

    /// Replaces the options.
    ///
    /// Recognized options missing from `options` reset to their defaults;
    /// unrecognized keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if a recognized option has the wrong
    /// type. The current options are kept in that case.
    pub fn set_options(&mut self, options: &Value) -> CoreResult<()> {
        self.options = SchemaOptions::from_value(options)?;
        Ok(())
    }

    /// Returns a copy of the definition in its JSON form.
    #[must_use]
    pub fn definition(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, spec)| (name.clone(), spec.to_value()))
                .collect(),
        )
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> SchemaOptions {
        self.options
    }

    /// Returns true if records carry timestamps.
    #[must_use]
    pub fn timestamps(&self) -> bool {
        self.options.timestamps
    }

    /// Returns the declaration of `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, spec)| spec)
    }

    /// Iterates over the declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }
}

/// Typed builder for a [`Schema`].
///
/// ```
/// use docudb_core::{FieldSpec, FieldType, Schema};
///
/// let schema = Schema::builder()
///     .field("title", FieldSpec::new(FieldType::String).required())
///     .field("tags", FieldSpec::new(FieldType::Array))
///     .timestamps(true)
///     .build()
///     .unwrap();
///
/// assert!(schema.timestamps());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    fields: Vec<(String, FieldSpec)>,
    options: SchemaOptions,
}

impl SchemaBuilder {
    /// Declares a field. Declaration order is record field order.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    /// Sets whether records carry timestamps.
    #[must_use]
    pub fn timestamps(mut self, value: bool) -> Self {
        self.options.timestamps = value;
        self
    }

    /// Sets all options at once.
    #[must_use]
    pub fn options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] for an empty, duplicated or reserved
    /// field list, or a default that does not match its field type.
    pub fn build(self) -> CoreResult<Schema> {
        Schema::from_parts(self.fields, self.options)
    }
}
