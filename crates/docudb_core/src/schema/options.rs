//! Schema options.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Options governing records of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaOptions {
    /// Whether records carry `createdAt`/`updatedAt` timestamps.
    pub timestamps: bool,
}

impl SchemaOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether records carry timestamps.
    #[must_use]
    pub const fn timestamps(mut self, value: bool) -> Self {
        self.timestamps = value;
        self
    }

    /// Parses options from JSON.
    ///
    /// `null` yields the defaults. Recognized options missing from `options`
    /// take their default value; unrecognized keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if `options` is not an object or a
    /// recognized option has the wrong type.
    pub fn from_value(options: &Value) -> CoreResult<Self> {
        let map = match options {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => return Err(CoreError::config("schema options must be an object")),
        };

        let mut parsed = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "timestamps" => {
                    parsed.timestamps = value.as_bool().ok_or_else(|| {
                        CoreError::config("schema option `timestamps` must be a boolean")
                    })?;
                }
                _ => debug!(option = %key, "ignoring unrecognized schema option"),
            }
        }

        Ok(parsed)
    }

    /// Returns the options in their JSON form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "timestamps": self.timestamps })
    }
}
