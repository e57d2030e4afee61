//! Schema-less result records
//!
//! A record is an ordered JSON object; key order is kept exactly as the query
//! service sent it (serde_json is built with `preserve_order`). The first
//! record of a batch defines the canonical column order.

use serde_json::{Map, Value};

/// One result row
pub type Record = Map<String, Value>;

/// Returns the cell of `record` under `column`, if present
pub fn cell<'a>(record: &'a Record, column: &str) -> Option<&'a Value> {
    record.get(column)
}

/// True when the cell holds a native JSON number
pub fn is_native_number(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Number(_)))
}

/// Native numeric value of a cell, if it has one
pub fn native_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    }
}

/// Raw (unformatted) string form of a cell.
///
/// This is the text used for filtering, CSV export and category labels.
/// A missing cell renders as an empty string.
pub fn raw_text(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                n.as_f64().map(number_to_string).unwrap_or_else(|| n.to_string())
            }
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Shortest round-trip rendering of a double, switching to exponent form
/// outside `[1e-7, 1e21)` the way script engines print numbers.
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-7..1e21).contains(&magnitude) {
        return value.to_string();
    }

    // `{:e}` yields e.g. "1.5e-8" / "1e21"; exponents get an explicit sign
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}
