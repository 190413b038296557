//! Master Schema
//!
//! Schema-driven editing support for JSON master data files. A YAML schema
//! describes the shape of a data file; this crate fills in the fields a schema
//! requires, keeps switch-selected branches in step with their discriminant,
//! and validates values pasted from outside before they are accepted.
//!
//! ## Features
//!
//! - **Skeletons**: the minimal value satisfying a schema, with defaults,
//!   generated UUIDs and auto-increment ids
//! - **Non-destructive fill**: existing values are never overwritten; every
//!   added field is reported by path
//! - **Switch fields**: branches chosen by a sibling discriminant (`./field`)
//! - **Paste validation**: schemas compile to JSON Schema for untrusted input
//! - **Foreign keys**: id/display choices drawn from another master file
//! - **Lint**: static checks over schema files
//!
//! ## Example
//!
//! ```
//! use master_schema::{fill, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::from_value(json!({
//!     "type": "object",
//!     "properties": [
//!         { "key": "name", "type": "string" },
//!         { "key": "count", "type": "integer", "default": 1 }
//!     ]
//! })).unwrap();
//!
//! let outcome = fill(&json!({ "name": "Iron" }), &schema, &[]);
//! assert_eq!(outcome.data, json!({ "name": "Iron", "count": 1 }));
//! assert_eq!(outcome.added_fields, vec!["count"]);
//! ```

pub mod autoincrement;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod fill;
pub mod foreign_key;
pub mod lint;
pub mod loader;
pub mod merge;
pub mod path;
pub mod schema;
pub mod switch;
pub mod synth;
pub mod validator;
pub mod vector;

pub use autoincrement::calculate_auto_increment;
pub use clipboard::{ClipboardPayload, PasteError};
pub use config::EditorConfig;
pub use error::{Result, SchemaError};
pub use fill::{fill, validate_and_fill, FillOutcome};
pub use foreign_key::{resolve_options, ForeignKeyOption, ForeignKeyResolver};
pub use lint::{LintResult, SchemaLinter};
pub use loader::{load_schema_file, load_schema_str, SchemaDefinitions, SchemaDocument, SchemaFormat};
pub use merge::deep_merge;
pub use schema::{ForeignKey, ObjectProperty, Schema, SwitchSchema, ValueKind, ValueSchema, VectorShape};
pub use switch::process_switch_fields;
pub use synth::{synthesize, Synthesizer};
pub use validator::{Issue, ValidationIssues, Validator};
