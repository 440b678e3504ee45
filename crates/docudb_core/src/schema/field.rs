//! Field declarations.

use crate::error::{CoreError, CoreResult};
use crate::timestamp;
use serde_json::{Map, Value};
use std::fmt;

/// Declared type of a schema field.
///
/// Boxed variants (`String`, `Number`, `Boolean` in a definition) accept the
/// same values as their primitive counterparts and report the primitive name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `object`: any JSON object.
    Object,
    /// `String`
    BoxedString,
    /// `Number`
    BoxedNumber,
    /// `Boolean`
    BoxedBoolean,
    /// `Date`: an RFC 3339 timestamp string.
    Date,
    /// `Array`: any JSON array.
    Array,
}

impl FieldType {
    /// All field types, in declaration-name order.
    pub const ALL: [FieldType; 9] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Object,
        FieldType::BoxedString,
        FieldType::BoxedNumber,
        FieldType::BoxedBoolean,
        FieldType::Date,
        FieldType::Array,
    ];

    /// Looks up a type by the name used in schema definitions.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.declared_name() == name)
    }

    /// Returns the name used in schema definitions.
    #[must_use]
    pub const fn declared_name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::BoxedString => "String",
            FieldType::BoxedNumber => "Number",
            FieldType::BoxedBoolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::Array => "Array",
        }
    }

    /// Returns the logical (unboxed) type name, used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::String | FieldType::BoxedString => "string",
            FieldType::Number | FieldType::BoxedNumber => "number",
            FieldType::Boolean | FieldType::BoxedBoolean => "boolean",
            FieldType::Object => "object",
            FieldType::Date => "date",
            FieldType::Array => "array",
        }
    }

    /// Returns true if `value` is of this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String | FieldType::BoxedString => value.is_string(),
            FieldType::Number | FieldType::BoxedNumber => value.is_number(),
            FieldType::Boolean | FieldType::BoxedBoolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
            FieldType::Date => value.as_str().and_then(timestamp::parse).is_some(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the logical type name of a JSON value, for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declaration of one schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    field_type: FieldType,
    required: bool,
    default: Option<Value>,
}

impl FieldSpec {
    const KNOWN_PROPERTIES: [&'static str; 3] = ["type", "required", "default"];

    /// Creates an optional field without a default.
    #[must_use]
    pub const fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            default: None,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the value used when the field is absent.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Parses a field declaration such as
    /// `{"type": "string", "required": true, "default": "n/a"}`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the declaration is not an object, has
    /// unknown properties, lacks `type`, or has a mistyped property.
    pub fn from_value(name: &str, declaration: &Value) -> CoreResult<Self> {
        let declaration = declaration.as_object().ok_or_else(|| {
            CoreError::config(format!("field `{name}` must be declared as an object"))
        })?;

        if let Some(unknown) = declaration
            .keys()
            .find(|key| !Self::KNOWN_PROPERTIES.contains(&key.as_str()))
        {
            return Err(CoreError::config(format!(
                "field `{name}` has unknown property `{unknown}`"
            )));
        }

        let field_type = match declaration.get("type") {
            None => {
                return Err(CoreError::config(format!(
                    "field `{name}` is missing its `type`"
                )))
            }
            Some(Value::String(type_name)) => FieldType::from_name(type_name).ok_or_else(|| {
                CoreError::config(format!("field `{name}` has unknown type `{type_name}`"))
            })?,
            Some(_) => {
                return Err(CoreError::config(format!(
                    "field `{name}` must name its `type` as a string"
                )))
            }
        };

        let required = match declaration.get("required") {
            None => false,
            Some(Value::Bool(required)) => *required,
            Some(_) => {
                return Err(CoreError::config(format!(
                    "field `{name}` must declare `required` as a boolean"
                )))
            }
        };

        let spec = Self {
            field_type,
            required,
            default: declaration.get("default").filter(|v| !v.is_null()).cloned(),
        };
        spec.check(name)?;
        Ok(spec)
    }

    /// Checks that the default, if any, has the declared type.
    pub(crate) fn check(&self, name: &str) -> CoreResult<()> {
        match &self.default {
            Some(default) if !self.field_type.matches(default) => Err(CoreError::config(format!(
                "default for field `{name}` must be a {}, got {}",
                self.field_type,
                value_kind(default)
            ))),
            _ => Ok(()),
        }
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns true if the field must be present.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the default value, if any.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the declaration in its JSON form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut declaration = Map::new();
        declaration.insert(
            "type".to_string(),
            Value::from(self.field_type.declared_name()),
        );
        declaration.insert("required".to_string(), Value::Bool(self.required));
        if let Some(default) = &self.default {
            declaration.insert("default".to_string(), default.clone());
        }
        Value::Object(declaration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_declared_name_resolves() {
        for ty in FieldType::ALL {
            assert_eq!(FieldType::from_name(ty.declared_name()), Some(ty));
        }
        assert_eq!(FieldType::from_name("STRING"), None);
        assert_eq!(FieldType::from_name("integer"), None);
    }

    #[test]
    fn boxed_types_report_unboxed_names() {
        assert_eq!(FieldType::BoxedString.name(), "string");
        assert_eq!(FieldType::BoxedNumber.name(), "number");
        assert_eq!(FieldType::BoxedBoolean.name(), "boolean");
        assert_eq!(FieldType::BoxedNumber.to_string(), "number");
    }

    #[test]
    fn matching() {
        assert!(FieldType::String.matches(&json!("x")));
        assert!(FieldType::BoxedString.matches(&json!("x")));
        assert!(!FieldType::String.matches(&json!(1)));
        assert!(FieldType::Number.matches(&json!(1.5)));
        assert!(FieldType::BoxedBoolean.matches(&json!(false)));
        assert!(FieldType::Object.matches(&json!({"a": 1})));
        assert!(!FieldType::Object.matches(&json!([1])));
        assert!(!FieldType::Object.matches(&Value::Null));
        assert!(FieldType::Array.matches(&json!([])));
        assert!(FieldType::Date.matches(&json!("2026-10-16T09:30:00.000Z")));
        assert!(!FieldType::Date.matches(&json!("last tuesday")));
        assert!(!FieldType::Date.matches(&json!(1760606400000_u64)));
    }

    #[test]
    fn parse_full_declaration() {
        let spec = FieldSpec::from_value(
            "age",
            &json!({"type": "Number", "required": true, "default": 18}),
        )
        .unwrap();

        assert_eq!(spec.field_type(), FieldType::BoxedNumber);
        assert!(spec.is_required());
        assert_eq!(spec.default(), Some(&json!(18)));
    }

    #[test]
    fn parse_defaults_to_optional() {
        let spec = FieldSpec::from_value("name", &json!({"type": "string"})).unwrap();
        assert_eq!(spec, FieldSpec::new(FieldType::String));
    }

    #[test]
    fn parse_rejects_bad_declarations() {
        let cases = [
            json!("string"),
            json!({}),
            json!({"type": "integer"}),
            json!({"type": 3}),
            json!({"type": "string", "unique": true}),
            json!({"type": "string", "required": "yes"}),
            json!({"type": "number", "default": "ten"}),
            json!({"type": "Date", "default": "soon"}),
        ];

        for case in cases {
            let err = FieldSpec::from_value("f", &case).unwrap_err();
            assert!(matches!(err, CoreError::Config { .. }), "{case} -> {err}");
        }
    }

    #[test]
    fn mismatched_default_names_both_types() {
        let err = FieldSpec::from_value("n", &json!({"type": "Number", "default": true}))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid schema: default for field `n` must be a number, got boolean"
        );
    }

    #[test]
    fn to_value_roundtrips() {
        let spec = FieldSpec::new(FieldType::Date)
            .required()
            .default_value(json!("2026-01-01T00:00:00.000Z"));
        assert_eq!(FieldSpec::from_value("d", &spec.to_value()).unwrap(), spec);
    }
}
