//! Copy and paste of field values as JSON text

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::{Result, SchemaError};
use crate::schema::Schema;
use crate::validator::{ValidationIssues, Validator};

/// What a copy puts on the clipboard: the value and the schema it was edited with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    pub value: Value,
    pub schema: Schema,
}

/// Why pasted text was not accepted
#[derive(Debug, Error)]
pub enum PasteError {
    #[error("clipboard is empty")]
    Empty,

    #[error("clipboard does not contain valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("value does not match the schema: {0}")]
    Rejected(ValidationIssues),
}

/// Serialize `value` with its schema as pretty JSON
pub fn copy(value: &Value, schema: &Schema) -> Result<String> {
    let payload = ClipboardPayload {
        value: value.clone(),
        schema: schema.clone(),
    };
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Copy the value at JSON pointer `pointer` in `data`, paired with its schema
pub fn copy_at(data: &Value, schema: &Schema, pointer: &str) -> Result<String> {
    let value = data
        .pointer(pointer)
        .ok_or_else(|| SchemaError::NotFound(format!("no value at {}", pointer)))?;
    let node = schema_at(schema, data, pointer)
        .ok_or_else(|| SchemaError::NotFound(format!("no schema for {}", pointer)))?;
    copy(value, &node)
}

/// The schema governing the value at `pointer`.
///
/// Switch properties resolve against the data of their enclosing object.
pub fn schema_at(schema: &Schema, data: &Value, pointer: &str) -> Option<Schema> {
    let mut node = schema.clone();
    let mut current = data;

    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        let next = match (&node, current) {
            (Schema::Value(value), Value::Object(fields)) => {
                let property = value.as_object()?.property(&segment)?;
                match &property.schema {
                    Schema::Switch(switch) => Schema::Value(switch.resolve_in(fields)?.schema.clone()),
                    other => other.clone(),
                }
            }
            (Schema::Value(value), Value::Array(_)) => (*value.as_array()?.items).clone(),
            _ => return None,
        };
        let child = match current {
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
            other => other.get(segment.as_str()),
        };
        current = child?;
        node = next;
    }

    Some(node)
}

/// Parse clipboard text and check it with `validator`.
///
/// Text holding a copy payload contributes its `value`; any other JSON is
/// checked as-is. The accepted value comes back normalized.
pub fn paste(text: &str, validator: &Validator) -> std::result::Result<Value, PasteError> {
    if text.trim().is_empty() {
        return Err(PasteError::Empty);
    }

    let parsed: Value = serde_json::from_str(text)?;
    let candidate = match parsed {
        Value::Object(mut fields) => match fields.remove("value") {
            Some(value) => value,
            None => Value::Object(fields),
        },
        other => other,
    };

    validator.safe_parse(&candidate).map_err(PasteError::Rejected)
}
