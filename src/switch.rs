//! Regenerating switch branches after a discriminant changes

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::fill::FillOutcome;
use crate::merge::fill_missing;
use crate::schema::{ObjectSchema, Schema};
use crate::synth::Synthesizer;

/// Complete the switch branches of `updated` whose discriminant is `changed_key`.
///
/// Only switches keyed on `changed_key` whose value differs from `original`
/// are touched. The new case's skeleton is filled into the existing branch;
/// fields already there are kept. A value that matches no case leaves the
/// object unchanged.
pub fn process_switch_fields(
    schema: &ObjectSchema,
    original: &Value,
    updated: &Value,
    changed_key: &str,
) -> FillOutcome {
    let mut data = updated.clone();
    let mut added = Vec::new();

    let before = original.get(changed_key);
    let after = updated.get(changed_key);

    for property in &schema.properties {
        let Schema::Switch(switch) = &property.schema else {
            continue;
        };
        let Some(field) = switch.sibling_field() else {
            warn!(key = %property.key, path = %switch.switch, "unsupported switch path");
            continue;
        };
        if field != changed_key || before == after {
            continue;
        }

        let Some(case) = after.and_then(|value| switch.case_for(value)) else {
            debug!(key = %property.key, field, "no matching switch case, leaving branch");
            continue;
        };

        let Value::Object(fields) = &mut data else {
            continue;
        };
        let existing = fields.get(&property.key);
        let Some(skeleton) = Synthesizer::new(&[]).synthesize_value(&case.schema, existing) else {
            continue;
        };

        let branch = fields.entry(property.key.clone()).or_insert(Value::Null);
        if skeleton.is_object() && !branch.is_object() {
            *branch = Value::Object(Map::new());
        }
        fill_missing(branch, skeleton, &property.key, &mut added);
    }

    FillOutcome {
        data,
        added_fields: added,
    }
}
