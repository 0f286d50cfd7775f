//! Field name canonicalization
//!
//! Provider responses arrive in two naming conventions: legacy SDK attribute
//! names (`launch_config_name`, `ProtectedFromScaleIn`) and modern API field
//! names (`AutoScalingGroupARN`, `CreatedTime`). Everything downstream works
//! on a single snake_case schema produced here.
//!
//! ## Rules
//!
//! | Input | Output |
//! |-------|--------|
//! | `CreatedTime` | `created_time` |
//! | `AutoScalingGroupARN` | `auto_scaling_group_arn` |
//! | `VPCZoneIdentifier` | `vpc_zone_identifier` |
//! | `launch_config_name` | `launch_config_name` |
//!
//! An underscore is inserted before every uppercase run that is not at the
//! start of the name, then the name is lowercased. A run followed by a
//! lowercase letter gives up its last capital to the next word, so leading
//! acronyms stay together. Snake_case names are a fixed point.

use serde_json::{Map, Value};

/// Convert a single field name to its canonical snake_case form.
pub fn canonical_key(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let starts_run = !prev.is_ascii_uppercase();
            let ends_acronym = prev.is_ascii_uppercase() && next_is_lower;

            if prev != '_' && (starts_run || ends_acronym) {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out
}

/// Canonicalize every key of a record, recursing into nested records and
/// into arrays whose elements are records.
///
/// If two raw keys collapse to the same canonical key, the later one in the
/// map's iteration order wins.
pub fn canonicalize_record(record: Map<String, Value>) -> Map<String, Value> {
    record
        .into_iter()
        .map(|(key, value)| (canonical_key(&key), canonicalize_value(value)))
        .collect()
}

/// Canonicalize keys anywhere inside a JSON value. Scalars pass through.
pub fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(canonicalize_record(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize_value).collect()),
        other => other,
    }
}
