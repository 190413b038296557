//! Loading schema files and master data from disk
//!
//! Schema files are YAML (`.yml`, `.yaml`) or JSON. Reusable definitions live
//! in their own files, identified by a top-level `id`, and are inlined wherever
//! a node carries `ref: <id>`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, SchemaError};
use crate::merge::deep_merge;
use crate::schema::Schema;

/// Extensions scanned when no list is configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// Text format of a schema file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Yaml,
    Json,
}

impl SchemaFormat {
    /// YAML for `.yml`/`.yaml`, JSON for everything else
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => SchemaFormat::Yaml,
            _ => SchemaFormat::Json,
        }
    }
}

/// A schema file: the root schema node plus the file's `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub schema: Schema,
}

/// Decode schema text into an untyped tree
pub fn parse_text(text: &str, format: SchemaFormat) -> Result<Value> {
    Ok(match format {
        SchemaFormat::Yaml => serde_yaml::from_str(text)?,
        SchemaFormat::Json => serde_json::from_str(text)?,
    })
}

pub fn load_schema_str(text: &str, format: SchemaFormat) -> Result<Schema> {
    Schema::from_value(parse_text(text, format)?)
}

/// Load a schema document; a missing `id` falls back to the file stem
pub fn load_schema_file(path: impl AsRef<Path>) -> Result<SchemaDocument> {
    let path = path.as_ref();
    let tree = read_tree(path)?;
    document_from_tree(tree, path)
}

/// Locate a schema given a file path or a schema name inside `dir`
pub fn find_schema_file<S: AsRef<str>>(dir: &Path, name: &str, extensions: &[S]) -> Result<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }

    extensions
        .iter()
        .map(|ext| dir.join(format!("{}.{}", name, ext.as_ref())))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| SchemaError::NotFound(format!("schema '{}' in {}", name, dir.display())))
}

/// Load schema `name` from `dir` with references resolved against every
/// definition in `dir`. A `name` that is a path to an existing file is loaded
/// from there instead.
pub fn load_schema_in<S: AsRef<str>>(dir: &Path, name: &str, extensions: &[S]) -> Result<SchemaDocument> {
    let path = find_schema_file(dir, name, extensions)?;

    let definitions = if dir.is_dir() {
        SchemaDefinitions::scan_with_extensions(dir, extensions)?
    } else {
        SchemaDefinitions::new()
    };

    definitions.load_resolved(&path)
}

/// Load a JSON master data file
pub fn load_data_file(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SchemaError::NotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write a JSON master data file
pub fn write_data_file(path: impl AsRef<Path>, data: &Value, pretty: bool) -> Result<()> {
    let content = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };
    fs::write(path, content)?;
    Ok(())
}

fn read_tree(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(SchemaError::NotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    parse_text(&content, SchemaFormat::from_path(path))
}

fn document_from_tree(tree: Value, path: &Path) -> Result<SchemaDocument> {
    let mut document: SchemaDocument = serde_json::from_value(tree)?;
    if document.id.is_empty() {
        document.id = file_stem(path);
    }
    Ok(document)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reusable schema definitions, keyed by id
#[derive(Debug, Clone, Default)]
pub struct SchemaDefinitions {
    definitions: BTreeMap<String, Value>,
}

impl SchemaDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every schema file below `dir`
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self> {
        Self::scan_with_extensions(dir, DEFAULT_EXTENSIONS)
    }

    /// Collect schema files below `dir` whose extension is in `extensions`
    pub fn scan_with_extensions<S: AsRef<str>>(dir: impl AsRef<Path>, extensions: &[S]) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(SchemaError::NotFound(dir.display().to_string()));
        }

        let mut definitions = Self::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| extensions.iter().any(|allowed| allowed.as_ref() == ext))
                .unwrap_or(false);
            if !entry.file_type().is_file() || !matches {
                continue;
            }

            let tree = read_tree(path)?;
            let id = tree
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| file_stem(path));
            debug!(id = %id, path = %path.display(), "found schema definition");
            definitions.insert(id, tree);
        }

        info!(count = definitions.len(), dir = %dir.display(), "loaded schema definitions");
        Ok(definitions)
    }

    pub fn insert(&mut self, id: impl Into<String>, definition: Value) {
        self.definitions.insert(id.into(), definition);
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.definitions.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Inline every known `ref` in `tree`.
    ///
    /// The definition is merged over the referencing node and the `ref` tag is
    /// kept. A definition that refers back to itself is cut off with a stub
    /// node carrying the tag.
    pub fn resolve(&self, tree: &Value) -> Value {
        self.resolve_node(tree, &mut Vec::new())
    }

    /// Load a schema document with its references inlined
    pub fn load_resolved(&self, path: impl AsRef<Path>) -> Result<SchemaDocument> {
        let path = path.as_ref();
        let tree = self.resolve(&read_tree(path)?);
        document_from_tree(tree, path)
    }

    /// Fetch definition `id` as a parsed schema with its references inlined
    pub fn schema(&self, id: &str) -> Result<Schema> {
        let definition = self
            .get(id)
            .ok_or_else(|| SchemaError::UnresolvedRef(id.to_string()))?;
        let mut tree = self.resolve(definition);
        if let Value::Object(fields) = &mut tree {
            fields.remove("id");
        }
        Schema::from_value(tree)
    }

    fn resolve_node(&self, node: &Value, stack: &mut Vec<String>) -> Value {
        match node {
            Value::Array(items) => Value::Array(items.iter().map(|item| self.resolve_node(item, stack)).collect()),
            Value::Object(fields) => {
                let resolved: Map<String, Value> = fields
                    .iter()
                    .map(|(key, value)| (key.clone(), self.resolve_node(value, stack)))
                    .collect();

                let Some(tag) = fields.get("ref").and_then(Value::as_str) else {
                    return Value::Object(resolved);
                };
                let Some(definition) = self.definitions.get(tag) else {
                    warn!(reference = %tag, "reference not found");
                    return Value::Object(resolved);
                };

                if stack.iter().any(|visiting| visiting == tag) {
                    debug!(reference = %tag, "recursive reference, leaving stub");
                    return stub(resolved, definition);
                }

                stack.push(tag.to_string());
                let mut body = self.resolve_node(definition, stack);
                stack.pop();

                if let Value::Object(body_fields) = &mut body {
                    body_fields.remove("id");
                }
                let mut merged = deep_merge(&Value::Object(resolved), &body);
                if let Value::Object(merged_fields) = &mut merged {
                    merged_fields.insert("ref".to_string(), Value::String(tag.to_string()));
                }
                merged
            }
            other => other.clone(),
        }
    }
}

/// Referencing node standing in for a recursive definition.
///
/// Object definitions keep their type so the node still synthesizes to `{}`.
fn stub(mut node: Map<String, Value>, definition: &Value) -> Value {
    if definition.get("type") == Some(&Value::String("object".to_string())) && !node.contains_key("type") {
        node.insert("type".to_string(), Value::String("object".to_string()));
    }
    Value::Object(node)
}
