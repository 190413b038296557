//! Schema model for master data files
//!
//! A schema node is either a typed [`ValueSchema`] (`type: ...`) or a
//! [`SwitchSchema`] (`switch: ./field`). The distinction is made once, when the
//! node is parsed, and never re-sniffed afterwards.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{Result, SchemaError};

/// A node in a schema tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Schema {
    /// A node with a `type` tag
    Value(ValueSchema),
    /// A discriminated union selected by a sibling field
    Switch(SwitchSchema),
    /// A node with neither `type` nor `switch`; accepted as-is
    Untyped(Map<String, Value>),
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Schema::from_map(raw).map_err(de::Error::custom)
    }
}

impl Schema {
    /// Parse a schema node from an already-decoded JSON/YAML value
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(SchemaError::InvalidFormat(format!(
                "schema node must be a mapping, got {}",
                other
            ))),
        }
    }

    fn from_map(map: Map<String, Value>) -> Result<Self> {
        match (map.contains_key("type"), map.contains_key("switch")) {
            (true, true) => Err(SchemaError::InvalidFormat(
                "schema node declares both `type` and `switch`".to_string(),
            )),
            (true, false) => Ok(Schema::Value(serde_json::from_value(Value::Object(map))?)),
            (false, true) => Ok(Schema::Switch(serde_json::from_value(Value::Object(map))?)),
            (false, false) => Ok(Schema::Untyped(map)),
        }
    }

    pub fn is_value_schema(&self) -> bool {
        matches!(self, Schema::Value(_))
    }

    pub fn is_switch_schema(&self) -> bool {
        matches!(self, Schema::Switch(_))
    }

    pub fn as_value(&self) -> Option<&ValueSchema> {
        match self {
            Schema::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_switch(&self) -> Option<&SwitchSchema> {
        match self {
            Schema::Switch(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        self.as_value().and_then(ValueSchema::as_object)
    }

    pub fn as_array(&self) -> Option<&ArraySchema> {
        self.as_value().and_then(ValueSchema::as_array)
    }

    /// The raw `optional` flag: `None` when absent
    pub fn optional(&self) -> Option<bool> {
        match self {
            Schema::Value(v) => v.optional,
            Schema::Switch(s) => s.optional,
            Schema::Untyped(map) => map.get("optional").and_then(Value::as_bool),
        }
    }

    /// Only `optional: true` makes a field not required
    pub fn is_required(&self) -> bool {
        self.optional() != Some(true)
    }

    /// Whether the node is edited inline rather than as a nested panel.
    ///
    /// True for typed nodes that are neither objects nor arrays of objects.
    pub fn is_primitive_value(&self) -> bool {
        match self {
            Schema::Value(v) => v.is_primitive_value(),
            _ => false,
        }
    }

    /// Whether the node is an array whose items are objects
    pub fn is_object_array(&self) -> bool {
        self.as_array().map(ArraySchema::is_object_array).unwrap_or(false)
    }
}

/// A typed schema node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSchema {
    /// Type-specific settings, tagged by `type`
    #[serde(flatten)]
    pub kind: ValueKind,

    /// `Some(true)` marks the field optional; absent and `false` both mean required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,

    /// Cycle-detection tag for recursive schemas
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl ValueSchema {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            optional: None,
            reference: None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.optional != Some(true)
    }

    /// Required by an explicit `optional: false`
    pub fn is_explicitly_required(&self) -> bool {
        self.optional == Some(false)
    }

    /// The `type` tag as written in schema files
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            ValueKind::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArraySchema> {
        match &self.kind {
            ValueKind::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_primitive_value(&self) -> bool {
        match &self.kind {
            ValueKind::Object(_) => false,
            ValueKind::Array(a) => !a.is_object_array(),
            _ => true,
        }
    }
}

/// Type-specific part of a [`ValueSchema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ValueKind {
    String(StringSchema),
    Uuid(UuidSchema),
    Enum(EnumSchema),
    Integer(NumericSchema),
    Number(NumericSchema),
    Boolean(BooleanSchema),
    Vector2(VectorSchema),
    Vector3(VectorSchema),
    Vector4(VectorSchema),
    Vector2Int(VectorSchema),
    Vector3Int(VectorSchema),
    Vector4Int(VectorSchema),
    Object(ObjectSchema),
    Array(ArraySchema),
}

impl ValueKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::String(_) => "string",
            ValueKind::Uuid(_) => "uuid",
            ValueKind::Enum(_) => "enum",
            ValueKind::Integer(_) => "integer",
            ValueKind::Number(_) => "number",
            ValueKind::Boolean(_) => "boolean",
            ValueKind::Vector2(_) => "vector2",
            ValueKind::Vector3(_) => "vector3",
            ValueKind::Vector4(_) => "vector4",
            ValueKind::Vector2Int(_) => "vector2Int",
            ValueKind::Vector3Int(_) => "vector3Int",
            ValueKind::Vector4Int(_) => "vector4Int",
            ValueKind::Object(_) => "object",
            ValueKind::Array(_) => "array",
        }
    }

    /// Numeric settings for `integer` and `number` nodes
    pub fn as_numeric(&self) -> Option<&NumericSchema> {
        match self {
            ValueKind::Integer(n) | ValueKind::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Foreign key declared on a `string`, `uuid`, `integer` or `number` node
    pub fn foreign_key(&self) -> Option<&ForeignKey> {
        match self {
            ValueKind::String(s) => s.foreign_key.as_ref(),
            ValueKind::Uuid(u) => u.foreign_key.as_ref(),
            ValueKind::Integer(n) | ValueKind::Number(n) => n.foreign_key.as_ref(),
            _ => None,
        }
    }

    /// Vector settings and shape for the six vector types
    pub fn as_vector(&self) -> Option<(&VectorSchema, VectorShape)> {
        let (schema, dimension, integer) = match self {
            ValueKind::Vector2(v) => (v, 2, false),
            ValueKind::Vector3(v) => (v, 3, false),
            ValueKind::Vector4(v) => (v, 4, false),
            ValueKind::Vector2Int(v) => (v, 2, true),
            ValueKind::Vector3Int(v) => (v, 3, true),
            ValueKind::Vector4Int(v) => (v, 4, true),
            _ => return None,
        };
        Some((schema, VectorShape { dimension, integer }))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UuidSchema {
    /// Generate a fresh v4 UUID instead of `""`
    #[serde(default)]
    pub auto_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumSchema {
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Settings shared by `integer` and `number`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_increment: Option<AutoIncrement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Vec<Number>>,
}

/// Dimension and element kind of a vector type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorShape {
    pub dimension: usize,
    /// `vectorNInt` types only accept whole numbers
    pub integer: bool,
}

/// An object with ordered, named properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(default)]
    pub properties: Vec<ObjectProperty>,
}

impl ObjectSchema {
    /// Find a property by key
    pub fn property(&self, key: &str) -> Option<&ObjectProperty> {
        self.properties.iter().find(|p| p.key == key)
    }
}

/// One named entry of an [`ObjectSchema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectProperty {
    pub key: String,
    #[serde(flatten)]
    pub schema: Schema,
}

impl ObjectProperty {
    pub fn new(key: impl Into<String>, schema: Schema) -> Self {
        Self {
            key: key.into(),
            schema,
        }
    }
}

/// A homogeneous array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArraySchema {
    pub items: Box<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl ArraySchema {
    pub fn min_length(&self) -> usize {
        self.min_length.unwrap_or(0)
    }

    pub fn is_object_array(&self) -> bool {
        self.items.as_object().is_some()
    }

    /// Keys of the inline-editable columns when the array is shown as a table
    pub fn table_columns(&self) -> Result<Vec<&str>> {
        let items = self.items.as_object().ok_or_else(|| {
            SchemaError::NotTabular(format!(
                "items must be an object, got {}",
                describe(&self.items)
            ))
        })?;

        Ok(items
            .properties
            .iter()
            .filter(|p| {
                p.schema
                    .as_value()
                    .map(|v| !matches!(v.kind, ValueKind::Object(_) | ValueKind::Array(_)))
                    .unwrap_or(false)
            })
            .map(|p| p.key.as_str())
            .collect())
    }
}

/// A discriminated union: the case is chosen by a sibling field's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchSchema {
    /// Path of the discriminant field; only `./field` is supported
    pub switch: String,
    #[serde(default)]
    pub cases: Vec<SwitchCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

impl SwitchSchema {
    pub fn is_required(&self) -> bool {
        self.optional != Some(true)
    }

    /// The sibling field named by a `./field` path
    pub fn sibling_field(&self) -> Option<&str> {
        self.switch
            .strip_prefix("./")
            .filter(|field| !field.is_empty() && !field.contains('/'))
    }

    /// The case whose `when` equals `value`
    pub fn case_for(&self, value: &Value) -> Option<&SwitchCase> {
        self.cases.iter().find(|c| &c.when == value)
    }

    /// Resolve the case selected by the discriminant in `object`.
    ///
    /// Unsupported paths, a missing discriminant and an unmatched value all
    /// resolve to `None`.
    pub fn resolve<'a>(&'a self, object: &Value) -> Option<&'a SwitchCase> {
        self.resolve_in(object.as_object()?)
    }

    /// [`SwitchSchema::resolve`] against an object's fields
    pub fn resolve_in<'a>(&'a self, fields: &Map<String, Value>) -> Option<&'a SwitchCase> {
        let field = self.sibling_field()?;
        self.case_for(fields.get(field)?)
    }
}

/// One branch of a [`SwitchSchema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub when: Value,
    #[serde(flatten)]
    pub schema: ValueSchema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Auto-increment rule for `integer`/`number` fields of array elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoIncrement {
    pub direction: Direction,
    pub step: f64,
    pub start_with: f64,
}

/// Reference from a field to records of another master file.
///
/// Paths use `[*]` for "every element" (`/data/[*]/itemGuid`); see
/// [`crate::foreign_key`] for how they are expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub schema_id: String,
    pub foreign_key_id_path: String,
    pub display_element_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hierarchy_display_paths: Vec<String>,
}

fn describe(schema: &Schema) -> &'static str {
    match schema {
        Schema::Value(v) => v.type_name(),
        Schema::Switch(_) => "switch",
        Schema::Untyped(_) => "untyped node",
    }
}
