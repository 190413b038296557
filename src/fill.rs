//! Filling missing required fields in existing data
//!
//! [`fill`] merges the schema's skeleton under existing data without touching
//! anything already present, then walks into nested objects, switch branches
//! and arrays of objects so every level is completed. Each written field is
//! reported by path.

use serde_json::Value;

use crate::merge::fill_missing;
use crate::path;
use crate::schema::{Schema, ValueKind, ValueSchema};
use crate::synth::Synthesizer;

/// Result of a fill pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FillOutcome {
    /// The completed data
    pub data: Value,
    /// Paths of every field that was written, in the order they were written
    pub added_fields: Vec<String>,
}

impl FillOutcome {
    /// Whether the pass changed nothing
    pub fn is_unchanged(&self) -> bool {
        self.added_fields.is_empty()
    }
}

/// Fill `existing` against an optional schema.
///
/// Without a schema the data is passed through untouched.
pub fn validate_and_fill(existing: &Value, schema: Option<&Schema>, siblings: &[Value]) -> FillOutcome {
    match schema {
        Some(schema) => fill(existing, schema, siblings),
        None => FillOutcome {
            data: existing.clone(),
            added_fields: Vec::new(),
        },
    }
}

/// Fill the required fields of `existing` that are absent or `null`.
///
/// `siblings` are the records of the array `existing` belongs to, if any; they
/// drive auto-increment fields.
pub fn fill(existing: &Value, schema: &Schema, siblings: &[Value]) -> FillOutcome {
    let mut data = existing.clone();
    let mut added = Vec::new();

    if let Schema::Value(value) = schema {
        fill_value(&mut data, value, siblings, "", &mut added);
    }

    FillOutcome {
        data,
        added_fields: added,
    }
}

fn fill_value(data: &mut Value, schema: &ValueSchema, siblings: &[Value], at: &str, added: &mut Vec<String>) {
    let skeleton = Synthesizer::new(siblings).synthesize_value(schema, Some(&*data));
    if let Some(skeleton) = skeleton {
        fill_missing(data, skeleton, at, added);
    }
    descend(data, schema, at, added);
}

/// Fill element `index` of `array`; the whole array is the sibling context
fn fill_element(array: &mut [Value], index: usize, items: &ValueSchema, at: &str, added: &mut Vec<String>) {
    let skeleton = Synthesizer::new(&*array).synthesize_value(items, Some(&array[index]));
    let element = &mut array[index];
    if let Some(skeleton) = skeleton {
        fill_missing(element, skeleton, at, added);
    }
    descend(element, items, at, added);
}

fn descend(data: &mut Value, schema: &ValueSchema, at: &str, added: &mut Vec<String>) {
    match &schema.kind {
        ValueKind::Object(object) => {
            let Value::Object(fields) = data else {
                return;
            };

            for property in &object.properties {
                let child = path::key(at, &property.key);

                match &property.schema {
                    Schema::Switch(switch) => {
                        let Some(case) = switch.resolve_in(fields) else {
                            continue;
                        };
                        match fields.get_mut(&property.key) {
                            Some(branch) => fill_value(branch, &case.schema, &[], &child, added),
                            // Discriminant was only just filled in, so the skeleton had no branch
                            None if switch.is_required() => {
                                let mut branch = Value::Null;
                                fill_value(&mut branch, &case.schema, &[], &child, added);
                                if !branch.is_null() {
                                    fields.insert(property.key.clone(), branch);
                                }
                            }
                            None => {}
                        }
                    }
                    Schema::Value(value) => {
                        let Some(nested) = fields.get_mut(&property.key) else {
                            continue;
                        };
                        match &value.kind {
                            ValueKind::Object(_) => fill_value(nested, value, &[], &child, added),
                            ValueKind::Array(array) => {
                                if let Some(items) = array.items.as_value().filter(|i| i.as_object().is_some()) {
                                    fill_elements(nested, items, &child, added);
                                }
                            }
                            _ => {}
                        }
                    }
                    Schema::Untyped(_) => {}
                }
            }
        }
        ValueKind::Array(array) => {
            if let Some(items) = array.items.as_value().filter(|i| i.as_object().is_some()) {
                fill_elements(data, items, at, added);
            }
        }
        _ => {}
    }
}

fn fill_elements(data: &mut Value, items: &ValueSchema, at: &str, added: &mut Vec<String>) {
    let Value::Array(elements) = data else {
        return;
    };
    for index in 0..elements.len() {
        fill_element(elements, index, items, &path::index(at, index), added);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        Schema::from_value(value).unwrap()
    }

    fn block_schema() -> Schema {
        schema(json!({
            "type": "object",
            "properties": [
                { "key": "name", "type": "string" },
                { "key": "blockType", "type": "enum", "options": ["Block", "ElectricMachine"], "default": "Block" },
                {
                    "key": "blockParam",
                    "switch": "./blockType",
                    "cases": [
                        {
                            "when": "ElectricMachine",
                            "type": "object",
                            "properties": [
                                { "key": "requiredPower", "type": "number", "default": 5 },
                                { "key": "inputSlotCount", "type": "integer" }
                            ]
                        },
                        { "when": "Block", "type": "object", "properties": [] }
                    ]
                },
                { "key": "earnItemHps", "type": "array", "items": { "type": "integer" } }
            ]
        }))
    }

    #[test]
    fn test_without_schema_passes_through() {
        let data = json!({ "anything": [1, 2, 3] });
        let outcome = validate_and_fill(&data, None, &[]);
        assert_eq!(outcome.data, data);
        assert!(outcome.is_unchanged());
    }

    #[test]
    fn test_untyped_schema_passes_through() {
        let data = json!({ "a": 1 });
        let outcome = fill(&data, &schema(json!({ "title": "free" })), &[]);
        assert_eq!(outcome.data, data);
        assert!(outcome.added_fields.is_empty());
    }

    #[test]
    fn test_switch_branch_is_completed() {
        let data = json!({
            "name": "Generator",
            "blockType": "ElectricMachine",
            "blockParam": { "inputSlotCount": 3 },
            "earnItemHps": [0, 10, 20]
        });

        let outcome = fill(&data, &block_schema(), &[]);

        assert_eq!(outcome.data["blockParam"]["requiredPower"], json!(5));
        assert_eq!(outcome.data["blockParam"]["inputSlotCount"], json!(3));
        assert_eq!(outcome.data["earnItemHps"], json!([0, 10, 20]));
        assert_eq!(outcome.added_fields, vec!["blockParam.requiredPower"]);
    }

    #[test]
    fn test_null_fields_are_replaced() {
        let data = json!({
            "name": null,
            "blockType": "Block",
            "blockParam": {},
            "earnItemHps": []
        });

        let outcome = fill(&data, &block_schema(), &[]);

        assert_eq!(outcome.data["name"], json!(""));
        assert_eq!(outcome.added_fields, vec!["name"]);
    }

    #[test]
    fn test_array_elements_get_auto_increment() {
        let schema = schema(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": [
                    {
                        "key": "id",
                        "type": "integer",
                        "autoIncrement": { "direction": "asc", "step": 1, "startWith": 1 }
                    },
                    { "key": "name", "type": "string" }
                ]
            }
        }));

        let outcome = fill(&json!([{ "name": "Sword" }]), &schema, &[]);
        assert_eq!(outcome.data, json!([{ "name": "Sword", "id": 1 }]));
        assert_eq!(outcome.added_fields, vec!["[0].id"]);

        let outcome = fill(&json!([{ "name": "Sword" }, { "name": "Shield" }]), &schema, &[]);
        assert_eq!(outcome.data[0]["id"], json!(1));
        assert_eq!(outcome.data[1]["id"], json!(2));
        assert_eq!(outcome.added_fields, vec!["[0].id", "[1].id"]);
    }

    #[test]
    fn test_nested_object_arrays() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                {
                    "key": "data",
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": [
                            { "key": "itemGuid", "type": "uuid" },
                            {
                                "key": "recipe",
                                "type": "object",
                                "properties": [{ "key": "time", "type": "number", "default": 1.5 }]
                            }
                        ]
                    }
                }
            ]
        }));

        let data = json!({ "data": [{ "itemGuid": "x" }, { "recipe": {} }] });
        let outcome = fill(&data, &schema, &[]);

        assert_eq!(
            outcome.data,
            json!({
                "data": [
                    { "itemGuid": "x", "recipe": { "time": 1.5 } },
                    { "recipe": { "time": 1.5 }, "itemGuid": "" }
                ]
            })
        );
        assert_eq!(
            outcome.added_fields,
            vec!["data[0].recipe", "data[1].itemGuid", "data[1].recipe.time"]
        );
    }

    #[test]
    fn test_fill_is_idempotent() {
        let data = json!({ "blockType": "ElectricMachine" });
        let first = fill(&data, &block_schema(), &[]);
        assert!(!first.added_fields.is_empty());

        let second = fill(&first.data, &block_schema(), &[]);
        assert!(second.added_fields.is_empty());
        assert_eq!(second.data, first.data);
    }

    #[test]
    fn test_switch_before_defaulted_discriminant() {
        let schema = schema(json!({
            "type": "object",
            "properties": [
                {
                    "key": "config",
                    "switch": "./kind",
                    "cases": [
                        {
                            "when": "weapon",
                            "type": "object",
                            "properties": [{ "key": "damage", "type": "integer" }]
                        }
                    ]
                },
                { "key": "kind", "type": "enum", "options": ["weapon"], "default": "weapon" }
            ]
        }));

        let first = fill(&json!({}), &schema, &[]);
        assert_eq!(first.data, json!({ "kind": "weapon", "config": { "damage": 0 } }));
        assert_eq!(first.added_fields, vec!["kind", "config"]);

        let second = fill(&first.data, &schema, &[]);
        assert!(second.added_fields.is_empty());
        assert_eq!(second.data, first.data);
    }

    #[test]
    fn test_present_values_are_not_replaced() {
        let data = json!({
            "name": 42,
            "blockType": "Unknown",
            "blockParam": "not an object",
            "earnItemHps": "not an array"
        });

        let outcome = fill(&data, &block_schema(), &[]);
        assert_eq!(outcome.data, data);
        assert!(outcome.added_fields.is_empty());
    }

    #[test]
    fn test_missing_root_is_synthesized() {
        let outcome = fill(&Value::Null, &block_schema(), &[]);
        assert_eq!(outcome.data["blockType"], json!("Block"));
        assert_eq!(outcome.data["blockParam"], json!({}));
        assert_eq!(outcome.added_fields, vec![path::ROOT]);
    }
}
