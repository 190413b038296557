//! Validator, Clipboard and Lint Tests
//!
//! Runs paste validation, copy payloads and schema linting against the
//! fixtures under `tests/fixtures`.

use master_schema::clipboard::{copy_at, paste, schema_at};
use master_schema::loader::{parse_text, SchemaFormat};
use master_schema::{
    ForeignKeyResolver, PasteError, Schema, SchemaDefinitions, SchemaDocument, SchemaLinter, Validator,
};
use serde_json::{json, Value};

fn load(text: &str) -> SchemaDocument {
    let mut definitions = SchemaDefinitions::new();
    let gear = parse_text(include_str!("fixtures/ref/gear.yml"), SchemaFormat::Yaml).unwrap();
    definitions.insert("gear", gear);

    let tree = parse_text(text, SchemaFormat::Yaml).unwrap();
    serde_json::from_value(definitions.resolve(&tree)).unwrap()
}

fn blocks_schema() -> Schema {
    load(include_str!("fixtures/blocks.yml")).schema
}

fn items_schema() -> Schema {
    load(include_str!("fixtures/items.yml")).schema
}

fn blocks_data() -> Value {
    serde_json::from_str(include_str!("fixtures/blocks.json")).unwrap()
}

fn block_validator() -> Validator {
    let block = schema_at(&blocks_schema(), &blocks_data(), "/data/0").unwrap();
    Validator::from_schema(&block).unwrap()
}

// =============================================================================
// Paste validation
// =============================================================================

#[test]
fn test_paste_block_is_normalized() {
    let text = r#"{
        "blockGuid": "1f2a3b4c-5d6e-4f70-8a9b-0c1d2e3f4a5b",
        "name": "Furnace",
        "blockType": "Block",
        "blockParam": {},
        "earnItemHps": [],
        "modelOffset": { "x": 1, "y": 2, "z": 3 },
        "comment": "not in the schema"
    }"#;

    let value = paste(text, &block_validator()).unwrap();

    assert_eq!(value["modelOffset"], json!([1, 2, 3]));
    assert!(value.get("comment").is_none());
    assert_eq!(value["name"], json!("Furnace"));
}

#[test]
fn test_paste_block_requires_guid() {
    let text = r#"{ "blockGuid": "", "name": "Furnace" }"#;

    let Err(PasteError::Rejected(issues)) = paste(text, &block_validator()) else {
        panic!("empty required guid must be rejected");
    };
    assert_eq!(issues.first().unwrap().path, "blockGuid");
}

#[test]
fn test_paste_block_rejects_unknown_block_type() {
    let text = r#"{ "blockGuid": "1f2a3b4c-5d6e-4f70-8a9b-0c1d2e3f4a5b", "name": "Furnace", "blockType": "Pipe" }"#;

    let Err(PasteError::Rejected(issues)) = paste(text, &block_validator()) else {
        panic!("unknown enum option must be rejected");
    };
    assert!(issues.issues.iter().any(|issue| issue.path == "blockType"));
}

#[test]
fn test_paste_items_reports_nested_path() {
    let value = json!({
        "data": [
            { "itemGuid": "0b6f4e2a-3c1d-4e5f-9a8b-7c6d5e4f3a2b", "name": "Sword", "maxStack": 1 },
            { "itemGuid": "1b6f4e2a-3c1d-4e5f-9a8b-7c6d5e4f3a2b", "name": "Shield", "maxStack": 0 }
        ]
    });

    let validator = Validator::from_schema(&items_schema()).unwrap();
    let issues = validator.safe_parse(&value).unwrap_err();

    assert_eq!(issues.first().unwrap().path, "data[1].maxStack");
    assert!(issues.to_string().starts_with("data[1].maxStack: "));
}

#[test]
fn test_paste_items_without_optional_fields() {
    let value = json!({ "data": [{ "itemGuid": "0b6f4e2a-3c1d-4e5f-9a8b-7c6d5e4f3a2b", "name": "Sword" }] });
    let validator = Validator::from_schema(&items_schema()).unwrap();
    assert!(validator.is_valid(&value));
}

// =============================================================================
// Copy payloads
// =============================================================================

#[test]
fn test_copy_switch_branch_uses_resolved_case() {
    let data = blocks_data();
    let text = copy_at(&data, &blocks_schema(), "/data/1/blockParam").unwrap();

    let payload: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(payload["value"], data["data"][1]["blockParam"]);
    assert_eq!(payload["schema"]["properties"][0]["key"], json!("gear"));

    let branch = schema_at(&blocks_schema(), &data, "/data/1/blockParam").unwrap();
    let validator = Validator::from_schema(&branch).unwrap();
    let pasted = paste(&text, &validator).unwrap();
    assert_eq!(pasted["gear"]["gearConnects"][0]["offset"], json!([0, 0, 1]));
}

#[test]
fn test_copy_vector_component() {
    let data = json!({ "data": [{ "modelOffset": [0.5, 1, 2] }] });
    let text = copy_at(&data, &blocks_schema(), "/data/0/modelOffset").unwrap();

    let payload: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(payload["schema"]["type"], json!("vector3"));
    assert_eq!(payload["value"], json!([0.5, 1, 2]));
}

#[test]
fn test_copy_missing_pointer() {
    assert!(copy_at(&blocks_data(), &blocks_schema(), "/data/7").is_err());
}

// =============================================================================
// Foreign keys
// =============================================================================

#[test]
fn test_recipe_result_lists_items() {
    let schema = load(include_str!("fixtures/recipes.yml")).schema;
    let recipes = json!({
        "data": [{ "resultItemGuid": "1b6f4e2a-3c1d-4e5f-9a8b-7c6d5e4f3a2b", "craftTime": 2 }]
    });
    let items = json!({
        "data": [
            { "itemGuid": "0b6f4e2a-3c1d-4e5f-9a8b-7c6d5e4f3a2b", "name": "Sword" },
            { "itemGuid": "1b6f4e2a-3c1d-4e5f-9a8b-7c6d5e4f3a2b", "name": "Shield" }
        ]
    });

    let node = schema_at(&schema, &recipes, "/data/0/resultItemGuid").unwrap();
    let key = node.as_value().and_then(|v| v.kind.foreign_key()).unwrap();
    assert_eq!(key.schema_id, "items");

    let resolver = ForeignKeyResolver::new(&items, key);
    let options = resolver.options();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].display, "Sword");
    assert_eq!(options[1].path, "/data/1/itemGuid");
    assert_eq!(
        resolver
            .display_for(&recipes["data"][0]["resultItemGuid"])
            .as_deref(),
        Some("Shield")
    );
}

#[test]
fn test_recipe_craft_time_has_no_foreign_key() {
    let schema = load(include_str!("fixtures/recipes.yml")).schema;
    let recipes = json!({ "data": [{ "craftTime": 2 }] });

    let node = schema_at(&schema, &recipes, "/data/0/craftTime").unwrap();
    assert!(node.as_value().and_then(|v| v.kind.foreign_key()).is_none());
}

// =============================================================================
// Lint
// =============================================================================

#[test]
fn test_lint_fixture_schemas_are_clean() {
    let linter = SchemaLinter::new();
    for text in [
        include_str!("fixtures/blocks.yml"),
        include_str!("fixtures/items.yml"),
        include_str!("fixtures/ref/gear.yml"),
        include_str!("fixtures/recipes.yml"),
    ] {
        let document = load(text);
        let result = linter.lint(&document);
        assert!(result.is_clean(), "{}: {:?}", document.id, result.errors);
        assert!(!result.has_warnings(), "{}: {:?}", document.id, result.warnings);
    }
}

#[test]
fn test_lint_broken_switch() {
    let document = load(include_str!("fixtures/broken_switch.yml"));
    let result = SchemaLinter::new().lint(&document);

    assert_eq!(result.schema_id, "brokenSwitch");

    let errors: Vec<&str> = result.errors.iter().map(|e| e.code).collect();
    assert_eq!(errors, vec!["enum-default-not-in-options", "unsupported-switch-path"]);

    let warnings: Vec<&str> = result.warnings.iter().map(|w| w.code).collect();
    assert_eq!(warnings, vec!["discriminant-after-switch", "empty-switch"]);
}
