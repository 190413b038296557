//! Vector values: tuples (`[x, y, z]`) in data, `{x, y, z}` objects accepted on paste

use serde_json::{Map, Value};

use crate::schema::VectorShape;

const COMPONENTS: [&str; 4] = ["x", "y", "z", "w"];

impl VectorShape {
    /// Component names in order, `x` through the vector's dimension
    pub fn components(&self) -> &'static [&'static str] {
        &COMPONENTS[..self.dimension.min(COMPONENTS.len())]
    }

    /// JSON Schema type name of one component
    pub fn component_type(&self) -> &'static str {
        if self.integer {
            "integer"
        } else {
            "number"
        }
    }
}

/// `{x, y, ..}` to `[x, y, ..]`; missing components become `0`
pub fn to_array(shape: VectorShape, object: &Map<String, Value>) -> Vec<Value> {
    shape
        .components()
        .iter()
        .map(|name| object.get(*name).cloned().unwrap_or_else(|| Value::from(0)))
        .collect()
}
