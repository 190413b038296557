//! Required-value synthesis
//!
//! Builds the skeleton of a schema: the smallest value holding every required
//! field, with defaults filled in. Optional fields are left out entirely.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::autoincrement::{calculate_auto_increment, number_value};
use crate::schema::{ArraySchema, ObjectSchema, Schema, ValueKind, ValueSchema};

/// Skeleton builder for one synthesis run.
///
/// `siblings` are the records of the array the synthesized value will live
/// in; auto-increment fields are computed against them.
pub struct Synthesizer<'a> {
    siblings: &'a [Value],
    visiting: HashSet<String>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(siblings: &'a [Value]) -> Self {
        Self {
            siblings,
            visiting: HashSet::new(),
        }
    }

    /// Skeleton for any schema node.
    ///
    /// For a switch node `context` is the enclosing object holding the
    /// discriminant. For a typed node it is the existing value at the same
    /// position, used to resolve switch branches further down.
    pub fn synthesize(&mut self, schema: &Schema, context: Option<&Value>) -> Option<Value> {
        match schema {
            Schema::Value(value) => self.synthesize_value(value, context),
            Schema::Switch(switch) => {
                if !switch.is_required() {
                    return None;
                }
                let case = switch.resolve(context?)?;
                self.synthesize_value(&case.schema, None)
            }
            Schema::Untyped(_) => None,
        }
    }

    /// Skeleton for a typed node; `None` when the node is optional
    pub fn synthesize_value(&mut self, schema: &ValueSchema, context: Option<&Value>) -> Option<Value> {
        if !schema.is_required() {
            return None;
        }

        if let Some(tag) = &schema.reference {
            if self.visiting.contains(tag) {
                debug!(reference = %tag, "recursive schema reference, stopping");
                return match schema.kind {
                    ValueKind::Object(_) => Some(Value::Object(Map::new())),
                    _ => None,
                };
            }
            self.visiting.insert(tag.clone());
        }

        let value = match &schema.kind {
            ValueKind::Object(object) => self.synthesize_object(object, context),
            ValueKind::Array(array) => self.synthesize_array(array),
            kind => default_value(kind),
        };

        if let Some(tag) = &schema.reference {
            self.visiting.remove(tag);
        }

        Some(value)
    }

    fn synthesize_object(&mut self, schema: &ObjectSchema, context: Option<&Value>) -> Value {
        let mut built = Map::new();

        for property in &schema.properties {
            let existing = context.and_then(|c| c.get(&property.key));

            let Schema::Switch(switch) = &property.schema else {
                if let Some(value) = self.synthesize(&property.schema, existing) {
                    built.insert(property.key.clone(), value);
                }
                continue;
            };

            if !switch.is_required() {
                continue;
            }
            let Some(field) = switch.sibling_field() else {
                warn!(key = %property.key, path = %switch.switch, "unsupported switch path");
                continue;
            };

            // Existing data decides the branch; otherwise the skeleton built so far
            let discriminant = context
                .and_then(|c| c.get(field))
                .filter(|v| !v.is_null())
                .or_else(|| built.get(field));
            let Some(case) = discriminant.and_then(|d| switch.case_for(d)) else {
                debug!(key = %property.key, field, "no matching switch case, omitting");
                continue;
            };

            if let Some(value) = self.synthesize_value(&case.schema, existing) {
                built.insert(property.key.clone(), value);
            }
        }

        for property in &schema.properties {
            let Some(value) = property.schema.as_value() else {
                continue;
            };
            let Some(rule) = value.kind.as_numeric().and_then(|n| n.auto_increment.as_ref()) else {
                continue;
            };
            if value.is_required() && built.contains_key(&property.key) {
                let next = calculate_auto_increment(self.siblings, &property.key, rule);
                built.insert(property.key.clone(), number_value(next));
            }
        }

        Value::Object(built)
    }

    fn synthesize_array(&mut self, schema: &ArraySchema) -> Value {
        let items = (0..schema.min_length())
            .filter_map(|_| self.synthesize(&schema.items, None))
            .collect();
        Value::Array(items)
    }
}

/// Skeleton of `schema` with no sibling records
pub fn synthesize(schema: &Schema, context: Option<&Value>) -> Option<Value> {
    Synthesizer::new(&[]).synthesize(schema, context)
}

/// Default for a leaf type: the declared `default`, else the type's zero value
fn default_value(kind: &ValueKind) -> Value {
    match kind {
        ValueKind::String(s) => Value::String(s.default.clone().unwrap_or_default()),
        ValueKind::Enum(e) => Value::String(e.default.clone().unwrap_or_default()),
        ValueKind::Uuid(u) if u.auto_generated => Value::String(uuid::Uuid::new_v4().to_string()),
        ValueKind::Uuid(_) => Value::String(String::new()),
        ValueKind::Integer(n) | ValueKind::Number(n) => {
            n.default.clone().map(Value::Number).unwrap_or_else(|| Value::from(0))
        }
        ValueKind::Boolean(b) => Value::Bool(b.default.unwrap_or(false)),
        ValueKind::Object(_) => Value::Object(Map::new()),
        ValueKind::Array(_) => Value::Array(Vec::new()),
        vector => match vector.as_vector() {
            Some((schema, shape)) => match &schema.default {
                Some(components) => Value::Array(components.iter().cloned().map(Value::Number).collect()),
                None => Value::Array(vec![Value::from(0); shape.dimension]),
            },
            None => Value::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        Schema::from_value(value).unwrap()
    }

    #[test]
    fn test_required_fields_only() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                { "key": "id", "type": "integer" },
                { "key": "name", "type": "string", "optional": false },
                { "key": "description", "type": "string", "optional": true },
                { "key": "enabled", "type": "boolean" },
                { "key": "kind", "type": "enum", "options": ["a", "b"] }
            ]
        }));

        assert_eq!(
            synthesize(&schema, None),
            Some(json!({ "id": 0, "name": "", "enabled": false, "kind": "" }))
        );
    }

    #[test]
    fn test_optional_root_is_omitted() {
        let schema = schema(json!({ "type": "object", "optional": true, "properties": [] }));
        assert_eq!(synthesize(&schema, None), None);
    }

    #[test]
    fn test_declared_defaults() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                { "key": "name", "type": "string", "default": "Iron" },
                { "key": "count", "type": "integer", "default": 64 },
                { "key": "ratio", "type": "number", "default": 0.5 },
                { "key": "stackable", "type": "boolean", "default": true },
                { "key": "offset", "type": "vector3", "default": [1, 2, 3] },
                { "key": "mode", "type": "enum", "options": ["on", "off"], "default": "off" }
            ]
        }));

        assert_eq!(
            synthesize(&schema, None),
            Some(json!({
                "name": "Iron",
                "count": 64,
                "ratio": 0.5,
                "stackable": true,
                "offset": [1, 2, 3],
                "mode": "off"
            }))
        );
    }

    #[test]
    fn test_vector_defaults() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                { "key": "a", "type": "vector2" },
                { "key": "b", "type": "vector3Int" },
                { "key": "c", "type": "vector4" }
            ]
        }));

        assert_eq!(
            synthesize(&schema, None),
            Some(json!({ "a": [0, 0], "b": [0, 0, 0], "c": [0, 0, 0, 0] }))
        );
    }

    #[test]
    fn test_uuid_generation() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                { "key": "guid", "type": "uuid", "autoGenerated": true },
                { "key": "plain", "type": "uuid" }
            ]
        }));

        let value = synthesize(&schema, None).unwrap();
        let guid = value["guid"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(guid).is_ok());
        assert_eq!(value["plain"], json!(""));

        let again = synthesize(&schema, None).unwrap();
        assert_ne!(again["guid"], value["guid"]);
    }

    #[test]
    fn test_array_min_length() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                {
                    "key": "slots",
                    "type": "array",
                    "minLength": 2,
                    "items": {
                        "type": "object",
                        "properties": [
                            { "key": "count", "type": "integer", "default": 1 },
                            { "key": "note", "type": "string", "optional": true }
                        ]
                    }
                },
                { "key": "tags", "type": "array", "items": { "type": "string" } },
                {
                    "key": "hidden",
                    "type": "array",
                    "minLength": 3,
                    "items": { "type": "string", "optional": true }
                }
            ]
        }));

        assert_eq!(
            synthesize(&schema, None),
            Some(json!({ "slots": [{ "count": 1 }, { "count": 1 }], "tags": [], "hidden": [] }))
        );
    }

    #[test]
    fn test_auto_increment_overrides_default() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                {
                    "key": "id",
                    "type": "integer",
                    "default": 99,
                    "autoIncrement": { "direction": "asc", "step": 1, "startWith": 1 }
                },
                {
                    "key": "order",
                    "type": "number",
                    "optional": true,
                    "autoIncrement": { "direction": "desc", "step": 1, "startWith": 0 }
                }
            ]
        }));

        let siblings = vec![json!({ "id": 4 }), json!({ "id": 2 })];
        let value = Synthesizer::new(&siblings).synthesize(&schema, None);
        assert_eq!(value, Some(json!({ "id": 5 })));

        assert_eq!(synthesize(&schema, None), Some(json!({ "id": 1 })));
    }

    #[test]
    fn test_switch_resolved_from_built_object() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                { "key": "kind", "type": "enum", "options": ["weapon", "armor"], "default": "weapon" },
                {
                    "key": "config",
                    "switch": "./kind",
                    "cases": [
                        {
                            "when": "weapon",
                            "type": "object",
                            "properties": [{ "key": "damage", "type": "integer" }]
                        },
                        {
                            "when": "armor",
                            "type": "object",
                            "properties": [{ "key": "defense", "type": "integer" }]
                        }
                    ]
                }
            ]
        }));

        assert_eq!(
            synthesize(&schema, None),
            Some(json!({ "kind": "weapon", "config": { "damage": 0 } }))
        );

        // The skeleton is merged under `existing`, whose `kind` survives, so the
        // branch must follow the existing discriminant rather than the default
        let existing = json!({ "kind": "armor" });
        assert_eq!(
            synthesize(&schema, Some(&existing)),
            Some(json!({ "kind": "weapon", "config": { "defense": 0 } }))
        );
    }

    #[test]
    fn test_switch_without_match_is_omitted() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                { "key": "kind", "type": "string" },
                {
                    "key": "config",
                    "switch": "./kind",
                    "cases": [{ "when": "weapon", "type": "object", "properties": [] }]
                },
                {
                    "key": "parentConfig",
                    "switch": "../kind",
                    "cases": [{ "when": "", "type": "object", "properties": [] }]
                }
            ]
        }));

        assert_eq!(synthesize(&schema, None), Some(json!({ "kind": "" })));
    }

    #[test]
    fn test_switch_node_uses_context() {
        let schema = schema(json!({
            "switch": "./kind",
            "cases": [
                { "when": "gear", "type": "object", "properties": [{ "key": "teeth", "type": "integer", "default": 8 }] }
            ]
        }));

        assert_eq!(synthesize(&schema, Some(&json!({ "kind": "gear" }))), Some(json!({ "teeth": 8 })));
        assert_eq!(synthesize(&schema, Some(&json!({ "kind": "belt" }))), None);
        assert_eq!(synthesize(&schema, None), None);
    }

    #[test]
    fn test_recursive_reference_stops() {
        let schema = schema(json!({
            "type": "object",
            "ref": "node",
            "properties": [
                { "key": "name", "type": "string" },
                {
                    "key": "child",
                    "type": "object",
                    "ref": "node",
                    "properties": [{ "key": "name", "type": "string" }]
                },
                {
                    "key": "label",
                    "type": "object",
                    "properties": [
                        { "key": "text", "type": "string", "ref": "node" }
                    ]
                }
            ]
        }));

        assert_eq!(
            synthesize(&schema, None),
            Some(json!({ "name": "", "child": {}, "label": {} }))
        );
    }

    #[test]
    fn test_sibling_references_do_not_collide() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                { "key": "a", "type": "object", "ref": "point", "properties": [{ "key": "x", "type": "number" }] },
                { "key": "b", "type": "object", "ref": "point", "properties": [{ "key": "x", "type": "number" }] }
            ]
        }));

        assert_eq!(
            synthesize(&schema, None),
            Some(json!({ "a": { "x": 0 }, "b": { "x": 0 } }))
        );
    }

    #[test]
    fn test_untyped_property_is_omitted() {
        let schema = schema(json!({
            "type": "object",
            "properties": [{ "key": "free", "description": "anything" }]
        }));
        assert_eq!(synthesize(&schema, None), Some(json!({})));
    }
}
