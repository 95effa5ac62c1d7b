//! Stable serialization of arbitrary JSON values for `const`/`enum` equality.

use serde_json::Value;

/// Defensive recursion cap. Real payloads never get close to this; it exists so a
/// pathologically deep value degrades to a sentinel rather than overflowing the stack.
const MAX_DEPTH: usize = 256;

const DEPTH_EXCEEDED_SENTINEL: &str = "\u{0}depth-exceeded\u{0}";

/// Produce a canonical string form of `value` such that two values compare equal under
/// this function iff they denote the same JSON value modulo object key order.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, 0, &mut out);
    out
}

fn write_canonical(value: &Value, depth: usize, out: &mut String) {
    if depth > MAX_DEPTH {
        out.push_str(DEPTH_EXCEEDED_SENTINEL);
        return;
    }
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            // serde_json's string serialization is already canonical (fixed escape table).
            out.push_str(&serde_json::to_string(s).unwrap_or_default());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, depth + 1, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, k) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(k).unwrap_or_default());
                out.push(':');
                write_canonical(&map[*k], depth + 1, out);
            }
            out.push('}');
        }
    }
}
