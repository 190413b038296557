//! Structural validation of untrusted values against a schema
//!
//! A [`Schema`] is compiled into a Draft 7 JSON Schema document and checked with
//! the `jsonschema` crate. Values that pass are normalized: vectors written as
//! `{x, y}` objects become tuples and object keys the schema does not declare
//! are dropped.

use std::fmt;

use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Map, Value};

use crate::error::{Result, SchemaError};
use crate::path;
use crate::schema::{Schema, ValueKind, ValueSchema};
use crate::vector;

const UUID_PATTERN: &str =
    "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Path of the offending value, `(root)` for the value itself
    pub path: String,
    pub message: String,
}

/// Every failure found in a rejected value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssues {
    pub issues: Vec<Issue>,
}

impl ValidationIssues {
    pub fn first(&self) -> Option<&Issue> {
        self.issues.first()
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some(issue) => write!(f, "{}: {}", issue.path, issue.message),
            None => write!(f, "invalid value"),
        }
    }
}

impl std::error::Error for ValidationIssues {}

/// Compiled validator for one schema node
pub struct Validator {
    compiled: JSONSchema,
    document: Value,
    required: bool,
    schema: Schema,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("document", &self.document)
            .field("required", &self.required)
            .finish()
    }
}

impl Validator {
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        let node = compile(schema);
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&node.document)
            .map_err(|e| SchemaError::Validator(e.to_string()))?;

        Ok(Self {
            compiled,
            document: node.document,
            required: node.required,
            schema: schema.clone(),
        })
    }

    /// The generated JSON Schema document
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Whether the field may be left out of its parent object
    pub fn accepts_missing(&self) -> bool {
        !self.required
    }

    /// Check `value`, returning its normalized form when it is accepted
    pub fn safe_parse(&self, value: &Value) -> std::result::Result<Value, ValidationIssues> {
        if let Err(errors) = self.compiled.validate(value) {
            let issues = errors
                .map(|error| Issue {
                    path: pointer_to_path(value, &error.instance_path.to_string()),
                    message: error.to_string(),
                })
                .collect();
            return Err(ValidationIssues { issues });
        }

        Ok(normalize(&self.schema, value))
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.compiled.is_valid(value)
    }
}

/// A compiled node and whether its parent must list it in `required`
struct Node {
    document: Value,
    required: bool,
}

impl Node {
    fn new(document: Value, required: bool) -> Self {
        Self { document, required }
    }

    fn any() -> Self {
        Self::new(Value::Bool(true), false)
    }
}

fn compile(schema: &Schema) -> Node {
    match schema {
        Schema::Value(value) => compile_value(value),
        Schema::Switch(switch) => {
            let mut cases: Vec<Node> = switch.cases.iter().map(|c| compile_value(&c.schema)).collect();
            match cases.len() {
                0 => Node::any(),
                1 => cases.remove(0),
                _ => {
                    let required = cases.iter().all(|c| c.required);
                    let any_of: Vec<Value> = cases.into_iter().map(|c| c.document).collect();
                    Node::new(json!({ "anyOf": any_of }), required)
                }
            }
        }
        Schema::Untyped(_) => Node::any(),
    }
}

fn compile_value(schema: &ValueSchema) -> Node {
    let explicit = schema.is_explicitly_required();

    match &schema.kind {
        ValueKind::String(_) => Node::new(json!({ "type": "string" }), schema.is_required()),
        ValueKind::Uuid(_) => {
            let uuid = json!({ "type": "string", "pattern": UUID_PATTERN });
            if explicit {
                Node::new(uuid, true)
            } else {
                Node::new(json!({ "anyOf": [uuid, { "const": "" }] }), false)
            }
        }
        ValueKind::Enum(e) if e.options.is_empty() => Node::new(json!({ "type": "string" }), false),
        ValueKind::Enum(e) => Node::new(json!({ "enum": e.options }), explicit),
        ValueKind::Integer(n) | ValueKind::Number(n) => {
            let mut document = Map::new();
            document.insert("type".to_string(), json!(schema.type_name()));
            if let Some(min) = n.min {
                document.insert("minimum".to_string(), json!(min));
            }
            if let Some(max) = n.max {
                document.insert("maximum".to_string(), json!(max));
            }
            Node::new(Value::Object(document), false)
        }
        ValueKind::Boolean(_) => Node::new(json!({ "type": "boolean" }), false),
        ValueKind::Object(object) => {
            let mut properties = Map::new();
            let mut required = Vec::new();
            for property in &object.properties {
                let node = compile(&property.schema);
                if node.required {
                    required.push(property.key.clone());
                }
                properties.insert(property.key.clone(), node.document);
            }
            Node::new(
                json!({ "type": "object", "properties": properties, "required": required }),
                false,
            )
        }
        ValueKind::Array(array) => {
            let mut document = Map::new();
            document.insert("type".to_string(), json!("array"));
            document.insert("items".to_string(), compile(&array.items).document);
            if let Some(max) = array.max_length {
                document.insert("maxItems".to_string(), json!(max));
            }
            Node::new(Value::Object(document), false)
        }
        kind => match kind.as_vector() {
            Some((_, shape)) => {
                let component = json!({ "type": shape.component_type() });
                let properties: Map<String, Value> = shape
                    .components()
                    .iter()
                    .map(|name| (name.to_string(), component.clone()))
                    .collect();
                let document = json!({
                    "anyOf": [
                        {
                            "type": "array",
                            "items": component,
                            "minItems": shape.dimension,
                            "maxItems": shape.dimension
                        },
                        {
                            "type": "object",
                            "properties": properties,
                            "required": shape.components()
                        }
                    ]
                });
                Node::new(document, explicit)
            }
            None => Node::any(),
        },
    }
}

/// Rewrite an accepted value into its canonical form
fn normalize(schema: &Schema, value: &Value) -> Value {
    match schema {
        Schema::Value(v) => normalize_value(v, value),
        _ => value.clone(),
    }
}

fn normalize_value(schema: &ValueSchema, value: &Value) -> Value {
    match (&schema.kind, value) {
        (ValueKind::Object(object), Value::Object(fields)) => {
            let mut normalized = Map::new();
            for property in &object.properties {
                let Some(field) = fields.get(&property.key) else {
                    continue;
                };
                let field = match &property.schema {
                    Schema::Switch(switch) => match switch.resolve_in(fields) {
                        Some(case) => normalize_value(&case.schema, field),
                        None => field.clone(),
                    },
                    other => normalize(other, field),
                };
                normalized.insert(property.key.clone(), field);
            }
            Value::Object(normalized)
        }
        (ValueKind::Array(array), Value::Array(items)) => {
            Value::Array(items.iter().map(|item| normalize(&array.items, item)).collect())
        }
        (kind, Value::Object(fields)) => match kind.as_vector() {
            Some((_, shape)) => Value::Array(vector::to_array(shape, fields)),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

/// `/items/0/name` to `items[0].name`, using the instance to tell indices from keys
fn pointer_to_path(instance: &Value, pointer: &str) -> String {
    let mut current = Some(instance);
    let mut at = String::new();

    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        match (current, segment.parse::<usize>()) {
            (Some(Value::Array(items)), Ok(index)) => {
                at = path::index(&at, index);
                current = items.get(index);
            }
            (node, _) => {
                current = node.and_then(|n| n.get(segment.as_str()));
                at = path::key(&at, &segment);
            }
        }
    }

    path::display(&at)
}
