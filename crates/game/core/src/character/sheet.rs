//! Dotted-path lookups into a character sheet.

use serde_json::Value;

/// Read-only character sheet as delivered by the content collaborator.
pub type Sheet = Value;

/// Resolves `path` (e.g. `attributes.physical.dexterity`) to a number.
///
/// Missing segments, non-numeric leaves, and non-object intermediates all
/// resolve to `0.0`; booleans count as 0/1.
pub fn lookup_number(sheet: &Sheet, path: &str) -> f64 {
    match lookup(sheet, path) {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::Bool(flag)) => f64::from(u8::from(*flag)),
        _ => 0.0,
    }
}

/// Resolves `path` to a string leaf.
pub fn lookup_str<'a>(sheet: &'a Sheet, path: &str) -> Option<&'a str> {
    lookup(sheet, path).and_then(Value::as_str)
}

/// Keys of the object at `path`, or nothing when absent or not an object.
pub fn lookup_keys<'a>(sheet: &'a Sheet, path: &str) -> Vec<&'a str> {
    match lookup(sheet, path) {
        Some(Value::Object(map)) => map.keys().map(String::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Raw value at `path`.
pub fn lookup<'a>(sheet: &'a Sheet, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(sheet, |node, segment| node.as_object()?.get(segment))
}
