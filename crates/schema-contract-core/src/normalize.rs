//! Rewrites the non-standard `required: true` property hint into the parent's
//! `required: string[]`, and sorts `properties`/`required` for determinism.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

const SCHEMA_CONTAINER_KEYWORDS: [&str; 6] = ["additionalProperties", "propertyNames", "not", "if", "then", "else"];
const SCHEMA_ARRAY_KEYWORDS: [&str; 3] = ["anyOf", "oneOf", "allOf"];
const DEFS_KEYWORDS: [&str; 2] = ["$defs", "definitions"];

/// Normalize `schema`, returning a new value. Idempotent on already-standard schemas.
pub fn normalize(schema: &Value) -> Value {
    normalize_node(schema)
}

fn normalize_node(node: &Value) -> Value {
    let Value::Object(obj) = node else {
        return node.clone();
    };
    let mut obj = obj.clone();

    if let Some(Value::Object(props)) = obj.get("properties") {
        let mut keys: Vec<String> = props.keys().cloned().collect();
        keys.sort();

        let mut hinted_required: BTreeSet<String> = BTreeSet::new();
        let mut new_props = Map::new();
        for key in &keys {
            let mut child = props[key].clone();
            if let Value::Object(child_obj) = &mut child {
                if child_obj.get("required") == Some(&Value::Bool(true)) {
                    child_obj.remove("required");
                    hinted_required.insert(key.clone());
                }
            }
            new_props.insert(key.clone(), normalize_node(&child));
        }
        obj.insert("properties".to_string(), Value::Object(new_props));

        let mut required: BTreeSet<String> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();
        required.extend(hinted_required);
        if !required.is_empty() {
            obj.insert(
                "required".to_string(),
                Value::Array(required.into_iter().map(Value::String).collect()),
            );
        }
    } else if let Some(Value::Array(arr)) = obj.get("required") {
        let sorted: BTreeSet<String> = arr.iter().filter_map(Value::as_str).map(String::from).collect();
        if !sorted.is_empty() {
            obj.insert(
                "required".to_string(),
                Value::Array(sorted.into_iter().map(Value::String).collect()),
            );
        }
    }

    // A root-level (parentless) `required: true` hint has nothing to attach to; drop it.
    if obj.get("required") == Some(&Value::Bool(true)) {
        obj.remove("required");
    }

    for keyword in SCHEMA_CONTAINER_KEYWORDS {
        if let Some(v) = obj.get(keyword) {
            if v.is_object() {
                let normalized = normalize_node(v);
                obj.insert(keyword.to_string(), normalized);
            }
        }
    }

    match obj.get("items").cloned() {
        Some(Value::Object(_)) => {
            let normalized = normalize_node(obj.get("items").unwrap());
            obj.insert("items".to_string(), normalized);
        }
        Some(Value::Array(items)) => {
            let normalized: Vec<Value> = items.iter().map(normalize_node).collect();
            obj.insert("items".to_string(), Value::Array(normalized));
        }
        _ => {}
    }

    for keyword in SCHEMA_ARRAY_KEYWORDS {
        if let Some(Value::Array(arr)) = obj.get(keyword).cloned() {
            let normalized: Vec<Value> = arr.iter().map(normalize_node).collect();
            obj.insert(keyword.to_string(), Value::Array(normalized));
        }
    }

    for keyword in DEFS_KEYWORDS {
        if let Some(Value::Object(defs)) = obj.get(keyword).cloned() {
            let mut normalized = Map::new();
            for (k, v) in defs {
                normalized.insert(k, normalize_node(&v));
            }
            obj.insert(keyword.to_string(), Value::Object(normalized));
        }
    }

    Value::Object(obj)
}
