//! Conservative `allOf` collapsing: materializes the effective properties and constraints
//! of a composed node without attempting full JSON Schema semantic evaluation.

use crate::resolver;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// If `node` has an `allOf`, recursively collapse each branch (resolving local refs first)
/// and fold them onto the node's own sibling keys. Nodes without `allOf` are returned
/// unchanged (still cloned, since the resolver/collapser contract never mutates caller
/// input in place).
pub fn collapse(root: &Value, node: &Value) -> Value {
    collapse_visited(root, node, &HashSet::new())
}

/// `visited` carries the local `$ref` pointers already expanded into an `allOf` branch
/// along the current chain, cloned (not shared) per branch so a cycle on one branch can't
/// poison an unrelated sibling that names the same ref. A branch that re-enters a pointer
/// already on its own chain is dropped rather than expanded further.
fn collapse_visited(root: &Value, node: &Value, visited: &HashSet<String>) -> Value {
    let Value::Object(obj) = node else {
        return node.clone();
    };
    let Some(Value::Array(branches)) = obj.get("allOf") else {
        return node.clone();
    };

    let mut acc_obj = obj.clone();
    acc_obj.remove("allOf");
    let mut acc = Value::Object(acc_obj);

    for branch in branches {
        let mut branch_visited = visited.clone();
        if let Some(r) = local_ref(branch) {
            if !branch_visited.insert(r) {
                continue;
            }
        }
        let resolved_branch = resolver::resolve(root, branch);
        let collapsed_branch = collapse_visited(root, &resolved_branch, &branch_visited);
        acc = merge_two(acc, collapsed_branch);
    }
    acc
}

/// The node's own local `$ref` pointer, if it has one.
fn local_ref(node: &Value) -> Option<String> {
    let r = node.as_object()?.get("$ref")?.as_str()?;
    r.starts_with('#').then(|| r.to_string())
}

/// Fold `overlay` onto `base` under §4.3's keyword table. Keywords not named there are
/// carried over with the overlay winning (conservative "last one wins" default).
fn merge_two(base: Value, overlay: Value) -> Value {
    // A boolean `false` schema absorbs everything; boolean `true` contributes nothing.
    if base_is_false(&base) || base_is_false(&overlay) {
        return Value::Bool(false);
    }
    if matches!(base, Value::Bool(true)) {
        return overlay;
    }
    if matches!(overlay, Value::Bool(true)) {
        return base;
    }

    let (Value::Object(mut base_obj), Value::Object(overlay_obj)) = (base, overlay) else {
        return Value::Bool(true);
    };

    for (key, overlay_val) in overlay_obj {
        match key.as_str() {
            "required" => {
                let merged = union_required(base_obj.get("required"), Some(&overlay_val));
                base_obj.insert(key, merged);
            }
            "properties" => {
                let merged = merge_properties(base_obj.get("properties"), &overlay_val);
                base_obj.insert(key, merged);
            }
            "additionalProperties" => {
                let merged = merge_additional_properties(base_obj.get("additionalProperties"), &overlay_val);
                base_obj.insert(key, merged);
            }
            "minimum" | "exclusiveMinimum" | "minLength" | "minItems" | "minProperties" => {
                let merged = tighten(base_obj.get(key.as_str()), &overlay_val, Ordering::Max);
                base_obj.insert(key, merged);
            }
            "maximum" | "exclusiveMaximum" | "maxLength" | "maxItems" | "maxProperties" => {
                let merged = tighten(base_obj.get(key.as_str()), &overlay_val, Ordering::Min);
                base_obj.insert(key, merged);
            }
            "multipleOf" | "pattern" | "format" | "contentEncoding" | "contentMediaType" | "propertyNames" => {
                match base_obj.get(key.as_str()) {
                    None => {
                        base_obj.insert(key, overlay_val);
                    }
                    Some(existing) if values_equal(existing, &overlay_val) => {}
                    Some(_) => {
                        base_obj.remove(&key);
                    }
                }
            }
            "items" => {
                let merged = merge_items(base_obj.get("items"), &overlay_val);
                base_obj.insert(key, merged);
            }
            _ => {
                base_obj.insert(key, overlay_val);
            }
        }
    }
    Value::Object(base_obj)
}

fn base_is_false(v: &Value) -> bool {
    matches!(v, Value::Bool(false))
}

enum Ordering {
    Min,
    Max,
}

fn tighten(existing: Option<&Value>, incoming: &Value, direction: Ordering) -> Value {
    let Some(existing) = existing else {
        return incoming.clone();
    };
    match (existing.as_f64(), incoming.as_f64()) {
        (Some(a), Some(b)) => {
            let keep_incoming = match direction {
                Ordering::Max => b > a,
                Ordering::Min => b < a,
            };
            if keep_incoming {
                incoming.clone()
            } else {
                existing.clone()
            }
        }
        _ => incoming.clone(),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    crate::canonical::canonicalize(a) == crate::canonical::canonicalize(b)
}

fn union_required(existing: Option<&Value>, incoming: Option<&Value>) -> Value {
    let mut set = std::collections::BTreeSet::new();
    for v in [existing, incoming].into_iter().flatten() {
        if let Value::Array(items) = v {
            for item in items {
                if let Some(s) = item.as_str() {
                    set.insert(s.to_string());
                }
            }
        }
    }
    Value::Array(set.into_iter().map(Value::String).collect())
}

fn merge_properties(existing: Option<&Value>, incoming: &Value) -> Value {
    let empty = Map::new();
    let existing_map = existing.and_then(Value::as_object).unwrap_or(&empty);
    let incoming_map = incoming.as_object().unwrap_or(&empty);

    let mut result = Map::new();
    let mut keys: std::collections::BTreeSet<&String> = existing_map.keys().collect();
    keys.extend(incoming_map.keys());
    for key in keys {
        match (existing_map.get(key), incoming_map.get(key)) {
            (Some(a), Some(b)) => {
                result.insert(key.clone(), merge_two(a.clone(), b.clone()));
            }
            (Some(a), None) => {
                result.insert(key.clone(), a.clone());
            }
            (None, Some(b)) => {
                result.insert(key.clone(), b.clone());
            }
            (None, None) => unreachable!("key came from one of the two maps"),
        }
    }
    Value::Object(result)
}

fn merge_additional_properties(existing: Option<&Value>, incoming: &Value) -> Value {
    match (existing, incoming) {
        (Some(Value::Bool(false)), _) | (_, Value::Bool(false)) => Value::Bool(false),
        (Some(a), Value::Bool(true)) if a.is_object() => a.clone(),
        (Some(Value::Bool(true)), b) if b.is_object() => b.clone(),
        (Some(a), b) if a.is_object() && b.is_object() => merge_two(a.clone(), b.clone()),
        (None, b) => b.clone(),
        (Some(a), _) => a.clone(),
    }
}

fn merge_items(existing: Option<&Value>, incoming: &Value) -> Value {
    match (existing, incoming) {
        (None, b) => b.clone(),
        (Some(a), b) if a.is_object() && b.is_object() => merge_two(a.clone(), b.clone()),
        // Tuple x schema (or tuple x tuple) is not merged; keep the base side conservatively.
        (Some(a), _) => a.clone(),
    }
}
