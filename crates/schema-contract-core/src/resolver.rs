//! Local `$ref` resolution: walk the root schema to the referent, merge local overrides,
//! and stop safely on cycles or missing targets.

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Resolve `node` against `root` if it carries a local `$ref` (`#` or `#/...`). Non-ref
/// nodes, and nodes with a non-local ref, are returned unchanged. A missing target
/// degrades to the original node (§7: reference resolution failure yields the unresolved
/// node).
pub fn resolve(root: &Value, node: &Value) -> Value {
    let Some(obj) = node.as_object() else {
        return node.clone();
    };
    let Some(Value::String(ref_str)) = obj.get("$ref") else {
        return node.clone();
    };
    if !ref_str.starts_with('#') {
        return node.clone();
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut current_ref = ref_str.clone();
    let mut last_good: Option<Value> = None;

    loop {
        if !visited.insert(current_ref.clone()) {
            debug!(pointer = %current_ref, "ref cycle detected, stopping at last resolved node");
            break;
        }
        match resolve_pointer(root, &current_ref) {
            Some(target) => {
                let next_ref = target
                    .as_object()
                    .and_then(|o| o.get("$ref"))
                    .and_then(Value::as_str)
                    .filter(|r| r.starts_with('#'))
                    .map(str::to_string);
                last_good = Some(target.clone());
                match next_ref {
                    Some(r) => {
                        current_ref = r;
                        continue;
                    }
                    None => break,
                }
            }
            None => {
                debug!(reference = %current_ref, "unresolvable local reference");
                break;
            }
        }
    }

    match last_good {
        Some(base) => merge_overlay(base, obj),
        None => node.clone(),
    }
}

/// Walk `#/a/b/c`-style pointers through `root`. Returns `None` if any segment is missing
/// or the container type doesn't match.
fn resolve_pointer<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let path = reference.strip_prefix('#')?;
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        return Some(root);
    }
    let mut current = root;
    for raw_segment in path.split('/') {
        let segment = crate::pointer::unescape_token(raw_segment);
        current = match current {
            Value::Object(map) => map.get(segment.as_ref())?,
            Value::Array(items) => {
                let idx: usize = segment.parse().ok()?;
                items.get(idx)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Start from `base` (the resolved referent) and overlay `overlay`'s own keys, excluding
/// `$ref` itself; local keys win.
fn merge_overlay(base: Value, overlay: &Map<String, Value>) -> Value {
    let Value::Object(mut base_obj) = base else {
        return base;
    };
    for (k, v) in overlay {
        if k == "$ref" {
            continue;
        }
        base_obj.insert(k.clone(), v.clone());
    }
    Value::Object(base_obj)
}
