use serde_json::Value;

use super::domain::{PropertySnapshot, Role};

/// Field names whose values must never reach a non-privileged consumer.
/// Process-wide constant configuration; not mutable at runtime.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "lockbox_code",
    "alarm_code",
    "gate_code",
    "smart_lock_pin",
];

const MASK_CHAR: char = '*';
const MASK_RUN: usize = 4;

/// Membership test against the sensitive-field registry. Dotted paths
/// resolve through their final segment, so a nested `access.gate_code`
/// is treated the same as the bare name.
pub fn is_sensitive(field: &str) -> bool {
    let leaf = field.rsplit('.').next().unwrap_or(field);
    SENSITIVE_FIELDS.contains(&leaf)
}

/// Whether a role may see a field at all.
pub fn can_view(role: Role, field: &str) -> bool {
    !is_sensitive(field) || role.is_privileged()
}

/// Deep copy of the snapshot with every sensitive field removed for
/// non-privileged roles. Privileged roles get an identical copy. This is
/// the choke point every outbound snapshot must pass through.
pub fn sanitize(snapshot: &PropertySnapshot, role: Role) -> PropertySnapshot {
    let mut sanitized = PropertySnapshot::new();
    for (name, value) in snapshot.iter() {
        if can_view(role, name) {
            sanitized.set(name.clone(), value.clone());
        }
    }
    sanitized
}

/// Same policy over an arbitrary JSON object graph: sensitive keys are
/// removed (not masked) at every nesting depth for non-privileged roles.
pub fn sanitize_json(value: Value, role: Role) -> Value {
    if role.is_privileged() {
        return value;
    }

    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !is_sensitive(key))
                .map(|(key, nested)| (key, sanitize_json(nested, role)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| sanitize_json(item, role))
                .collect(),
        ),
        other => other,
    }
}

/// Display-only obfuscation for a privileged-but-hidden value: first two
/// and last two characters survive around a fixed-width mask run. Inputs
/// of four characters or fewer come back as the mask run alone, so short
/// secrets do not leak their true length.
pub fn mask(value: &str) -> String {
    let run: String = std::iter::repeat(MASK_CHAR).take(MASK_RUN).collect();
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return run;
    }

    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}{run}{tail}")
}

/// Walk a JSON graph and report the first sensitive key present, if any.
/// Serialization boundaries assert on this in debug builds; tests use it
/// to pin the no-leak invariant.
pub fn find_sensitive(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if is_sensitive(key) {
                    return Some(key.clone());
                }
                if let Some(found) = find_sensitive(nested) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(find_sensitive),
        _ => None,
    }
}
