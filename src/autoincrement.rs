//! Auto-increment values for records in an array

use serde_json::{Number, Value};

use crate::schema::{AutoIncrement, Direction};

/// Next value for `key` given the sibling records of an array.
///
/// Only finite numbers at `key` are considered. With none, the rule's
/// `start_with` is returned; otherwise `max + step` (asc) or `min - step` (desc).
pub fn calculate_auto_increment(siblings: &[Value], key: &str, rule: &AutoIncrement) -> f64 {
    let values: Vec<f64> = siblings
        .iter()
        .filter_map(|record| record.get(key).and_then(Value::as_f64))
        .filter(|v| v.is_finite())
        .collect();

    if values.is_empty() {
        return rule.start_with;
    }

    match rule.direction {
        Direction::Asc => values.iter().copied().fold(f64::NEG_INFINITY, f64::max) + rule.step,
        Direction::Desc => values.iter().copied().fold(f64::INFINITY, f64::min) - rule.step,
    }
}

/// JSON number for `value`, written as an integer when it has no fraction
pub fn number_value(value: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}
