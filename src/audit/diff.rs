//! Change summaries for audit entries
//!
//! Compares the top-level fields of two record snapshots and describes
//! what changed, e.g. `amount: 10000 -> 12500, description: "" -> "Rent"`.

use serde_json::Value;

/// Fields that change on every edit and carry no information
const IGNORED_FIELDS: &[&str] = &["updated_at"];

/// Describe the field-level changes between two snapshots
///
/// Returns `None` when nothing but bookkeeping fields changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let changes = match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            let mut changes = Vec::new();
            for (key, old_val) in old {
                if IGNORED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                match new.get(key) {
                    Some(new_val) if new_val != old_val => changes.push(format!(
                        "{}: {} -> {}",
                        key,
                        format_value(old_val),
                        format_value(new_val)
                    )),
                    Some(_) => {}
                    None => {
                        changes.push(format!("{}: {} -> (cleared)", key, format_value(old_val)))
                    }
                }
            }
            for (key, new_val) in new {
                if !old.contains_key(key) {
                    changes.push(format!("{}: (unset) -> {}", key, format_value(new_val)));
                }
            }
            changes
        }
        _ if before != after => {
            vec![format!("{} -> {}", format_value(before), format_value(after))]
        }
        _ => Vec::new(),
    };

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.chars().count() > 40 => {
            let head: String = s.chars().take(37).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) => format!("{{{} fields}}", fields.len()),
        other => other.to_string(),
    }
}
