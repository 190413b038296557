//! Schema linting
//!
//! Catches schema mistakes the engine would otherwise absorb silently:
//! switches that can never resolve, enum defaults outside their options,
//! inverted bounds and malformed foreign key paths.
//!
//! ## Lints
//! 1. **Switches**: `./field` paths only, discriminant must be a sibling
//!    declared before the switch, at least one case
//! 2. **Objects**: property keys are unique
//! 3. **Values**: enum defaults, numeric and length bounds, auto-increment steps
//! 4. **Foreign keys**: `/data/[*]/field` style paths

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use walkdir::WalkDir;

use crate::error::Result;
use crate::loader::{self, SchemaDocument, DEFAULT_EXTENSIONS};
use crate::path;
use crate::schema::{ForeignKey, ObjectSchema, Schema, ValueKind, ValueSchema};

/// Result of linting a schema
#[derive(Debug, Default)]
pub struct LintResult {
    pub schema_id: String,
    pub errors: Vec<LintError>,
    pub warnings: Vec<LintWarning>,
}

impl LintResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn error(&mut self, code: &'static str, at: &str, message: String) {
        self.errors.push(LintError {
            code,
            message,
            path: path::display(at),
        });
    }

    fn warning(&mut self, code: &'static str, at: &str, message: String) {
        self.warnings.push(LintWarning {
            code,
            message,
            path: path::display(at),
        });
    }
}

#[derive(Debug)]
pub struct LintError {
    pub code: &'static str,
    pub message: String,
    pub path: String,
}

#[derive(Debug)]
pub struct LintWarning {
    pub code: &'static str,
    pub message: String,
    pub path: String,
}

/// The schema linter
pub struct SchemaLinter {
    /// `/data/[*]/itemGuid`
    foreign_key_path: Regex,
}

impl Default for SchemaLinter {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaLinter {
    pub fn new() -> Self {
        Self {
            foreign_key_path: Regex::new(r"^(/(\[\*\]|[A-Za-z_][A-Za-z0-9_]*))+$").expect("static pattern"),
        }
    }

    pub fn lint(&self, document: &SchemaDocument) -> LintResult {
        self.lint_schema(&document.id, &document.schema)
    }

    pub fn lint_schema(&self, schema_id: &str, schema: &Schema) -> LintResult {
        let mut result = LintResult {
            schema_id: schema_id.to_string(),
            ..Default::default()
        };

        self.lint_node(schema, "", &mut result);
        result
    }

    fn lint_node(&self, schema: &Schema, at: &str, result: &mut LintResult) {
        match schema {
            Schema::Value(value) => self.lint_value(value, at, result),
            Schema::Switch(switch) => {
                if switch.cases.is_empty() {
                    result.warning("empty-switch", at, "switch has no cases".to_string());
                }
                for case in &switch.cases {
                    let case_path = format!("{}[when={}]", at, case.when);
                    self.lint_value(&case.schema, &case_path, result);
                }
            }
            Schema::Untyped(_) => {}
        }
    }

    fn lint_value(&self, schema: &ValueSchema, at: &str, result: &mut LintResult) {
        match &schema.kind {
            ValueKind::Object(object) => self.lint_object(object, at, result),
            ValueKind::Array(array) => {
                if let (Some(min), Some(max)) = (array.min_length, array.max_length) {
                    if min > max {
                        result.error(
                            "invalid-bounds",
                            at,
                            format!("minLength {} is greater than maxLength {}", min, max),
                        );
                    }
                }
                self.lint_node(&array.items, &format!("{}[]", at), result);
            }
            ValueKind::Enum(e) => {
                if e.options.is_empty() {
                    result.warning("empty-enum", at, "enum has no options".to_string());
                }
                if let Some(default) = &e.default {
                    if !e.options.is_empty() && !e.options.contains(default) {
                        result.error(
                            "enum-default-not-in-options",
                            at,
                            format!("default '{}' is not one of {:?}", default, e.options),
                        );
                    }
                }
            }
            ValueKind::Integer(n) | ValueKind::Number(n) => {
                if let (Some(min), Some(max)) = (n.min, n.max) {
                    if min > max {
                        result.error("invalid-bounds", at, format!("min {} is greater than max {}", min, max));
                    }
                }
                if let Some(default) = n.default.as_ref().and_then(|d| d.as_f64()) {
                    let below = n.min.map(|min| default < min).unwrap_or(false);
                    let above = n.max.map(|max| default > max).unwrap_or(false);
                    if below || above {
                        result.error("invalid-bounds", at, format!("default {} is outside min/max", default));
                    }
                }
                if let Some(rule) = &n.auto_increment {
                    if rule.step <= 0.0 {
                        result.warning(
                            "auto-increment-step",
                            at,
                            format!("step {} never moves away from existing values", rule.step),
                        );
                    }
                }
            }
            _ => {}
        }

        self.lint_foreign_key(schema.kind.foreign_key(), at, result);
    }

    fn lint_object(&self, object: &ObjectSchema, at: &str, result: &mut LintResult) {
        let mut seen = HashSet::new();

        for (index, property) in object.properties.iter().enumerate() {
            let child = path::key(at, &property.key);

            if !seen.insert(property.key.as_str()) {
                result.error("duplicate-key", &child, format!("key '{}' is declared twice", property.key));
            }

            if let Schema::Switch(switch) = &property.schema {
                match switch.sibling_field() {
                    None => result.error(
                        "unsupported-switch-path",
                        &child,
                        format!("switch path '{}' is not of the form ./field", switch.switch),
                    ),
                    Some(field) => match object.properties.iter().position(|p| p.key == field) {
                        None => result.error(
                            "missing-discriminant",
                            &child,
                            format!("discriminant '{}' is not a sibling property", field),
                        ),
                        Some(position) if position > index => result.warning(
                            "discriminant-after-switch",
                            &child,
                            format!("discriminant '{}' is declared after the switch", field),
                        ),
                        Some(_) => {}
                    },
                }
            }

            self.lint_node(&property.schema, &child, result);
        }
    }

    fn lint_foreign_key(&self, foreign_key: Option<&ForeignKey>, at: &str, result: &mut LintResult) {
        let Some(foreign_key) = foreign_key else {
            return;
        };

        let paths = [
            ("foreignKeyIdPath", &foreign_key.foreign_key_id_path),
            ("displayElementPath", &foreign_key.display_element_path),
        ];
        let hierarchy = foreign_key
            .hierarchy_display_paths
            .iter()
            .map(|p| ("hierarchyDisplayPaths", p));

        for (field, value) in paths.into_iter().chain(hierarchy) {
            if !self.foreign_key_path.is_match(value) {
                result.error(
                    "invalid-foreign-key-path",
                    at,
                    format!("{} '{}' is not a path like /data/[*]/id", field, value),
                );
            }
        }
    }
}

/// Lint every schema file below `schema_dir`.
///
/// Files that do not parse are reported as an `invalid-schema` error.
pub fn lint_schemas(schema_dir: &Path) -> Result<Vec<LintResult>> {
    let linter = SchemaLinter::new();
    let mut results = Vec::new();

    for entry in WalkDir::new(schema_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let is_schema = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| DEFAULT_EXTENSIONS.contains(&ext))
            .unwrap_or(false);
        if !entry.file_type().is_file() || !is_schema {
            continue;
        }

        let result = match loader::load_schema_file(path) {
            Ok(document) => linter.lint(&document),
            Err(e) => {
                let mut result = LintResult {
                    schema_id: path.display().to_string(),
                    ..Default::default()
                };
                result.error("invalid-schema", "", e.to_string());
                result
            }
        };
        results.push(result);
    }

    Ok(results)
}
