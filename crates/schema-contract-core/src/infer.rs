//! Derive a best-guess schema from a single concrete payload value.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Infer a JSON Schema describing `payload`. Deliberately omits `additionalProperties` and
/// most constraint keywords — a single sample cannot justify them.
pub fn infer(payload: &Value) -> Value {
    match payload {
        Value::Null => scalar_schema("null"),
        Value::Bool(_) => scalar_schema("boolean"),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                scalar_schema("integer")
            } else {
                scalar_schema("number")
            }
        }
        Value::String(_) => scalar_schema("string"),
        Value::Array(items) => infer_array(items),
        Value::Object(map) => infer_object(map),
    }
}

fn scalar_schema(type_name: &str) -> Value {
    serde_json::json!({"type": type_name})
}

fn infer_object(map: &Map<String, Value>) -> Value {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut properties = Map::new();
    for key in &keys {
        properties.insert((*key).clone(), infer(&map[*key]));
    }
    let required: Vec<Value> = keys.into_iter().map(|k| Value::String(k.clone())).collect();

    serde_json::json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": Value::Array(required),
    })
}

fn infer_array(items: &[Value]) -> Value {
    let item_schema = items
        .iter()
        .map(infer)
        .reduce(merge_inferred)
        .unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::json!({"type": "array", "items": item_schema})
}

/// Conservatively merge two inferred element schemas. Same-shaped objects merge
/// properties (union of keys) with `required` narrowed to the intersection (only a key
/// present in every sampled element can be asserted required); same-shaped arrays merge
/// their item schema; anything else falls back to a bare type-union schema.
fn merge_inferred(a: Value, b: Value) -> Value {
    let a_type = a.get("type").and_then(Value::as_str);
    let b_type = b.get("type").and_then(Value::as_str);
    match (a_type, b_type) {
        (Some("object"), Some("object")) => merge_inferred_objects(a, b),
        (Some("array"), Some("array")) => merge_inferred_arrays(a, b),
        (Some(ta), Some(tb)) if ta == tb => a,
        _ => {
            let mut types: BTreeSet<String> = BTreeSet::new();
            collect_type_names(&a, &mut types);
            collect_type_names(&b, &mut types);
            serde_json::json!({"type": types.into_iter().collect::<Vec<_>>()})
        }
    }
}

fn collect_type_names(schema: &Value, out: &mut BTreeSet<String>) {
    match schema.get("type") {
        Some(Value::String(s)) => {
            out.insert(s.clone());
        }
        Some(Value::Array(items)) => {
            for item in items {
                if let Some(s) = item.as_str() {
                    out.insert(s.to_string());
                }
            }
        }
        _ => {}
    }
}

fn merge_inferred_objects(a: Value, b: Value) -> Value {
    let empty = Map::new();
    let a_props = a.get("properties").and_then(Value::as_object).unwrap_or(&empty).clone();
    let b_props = b.get("properties").and_then(Value::as_object).unwrap_or(&empty).clone();
    let a_required: BTreeSet<String> = a
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default();
    let b_required: BTreeSet<String> = b
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default();

    let mut keys: BTreeSet<&String> = a_props.keys().collect();
    keys.extend(b_props.keys());
    let mut properties = Map::new();
    for key in &keys {
        let merged = match (a_props.get(*key), b_props.get(*key)) {
            (Some(x), Some(y)) => merge_inferred(x.clone(), y.clone()),
            (Some(x), None) => x.clone(),
            (None, Some(y)) => y.clone(),
            (None, None) => unreachable!("key came from one of the two maps"),
        };
        properties.insert((*key).clone(), merged);
    }

    let required: Vec<Value> = a_required
        .intersection(&b_required)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(Value::String)
        .collect();

    serde_json::json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": Value::Array(required),
    })
}

fn merge_inferred_arrays(a: Value, b: Value) -> Value {
    let a_items = a.get("items").cloned().unwrap_or_else(|| Value::Object(Map::new()));
    let b_items = b.get("items").cloned().unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::json!({"type": "array", "items": merge_inferred(a_items, b_items)})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn scalars_infer_their_type() {
        assert_eq!(infer(&json!("x")), json!({"type": "string"}));
        assert_eq!(infer(&json!(true)), json!({"type": "boolean"}));
        assert_eq!(infer(&json!(null)), json!({"type": "null"}));
        assert_eq!(infer(&json!(5)), json!({"type": "integer"}));
        assert_eq!(infer(&json!(5.5)), json!({"type": "number"}));
    }

    #[test]
    fn object_properties_and_required_are_sorted() {
        let schema = infer(&json!({"b": 1, "a": "x"}));
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {"a": {"type": "string"}, "b": {"type": "integer"}},
                "required": ["a", "b"]
            })
        );
    }

    #[test]
    fn nested_objects_infer_recursively() {
        let schema = infer(&json!({"user": {"name": "Ada"}}));
        assert_eq!(
            schema["properties"]["user"],
            json!({"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]})
        );
    }

    #[test]
    fn homogeneous_array_infers_item_schema() {
        let schema = infer(&json!(["a", "b", "c"]));
        assert_eq!(schema, json!({"type": "array", "items": {"type": "string"}}));
    }

    #[test]
    fn heterogeneous_array_merges_conservatively() {
        let schema = infer(&json!(["a", 1]));
        assert_eq!(schema["items"]["type"], json!(["integer", "string"]));
    }

    #[test]
    fn array_of_objects_narrows_required_to_the_intersection() {
        let schema = infer(&json!([{"a": 1, "b": 2}, {"a": 1}]));
        assert_eq!(schema["items"]["required"], json!(["a"]));
        assert_eq!(schema["items"]["properties"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn empty_array_infers_an_unconstrained_item_schema() {
        assert_eq!(infer(&json!([])), json!({"type": "array", "items": {}}));
    }

    #[test]
    fn inferring_the_same_payload_twice_is_stable_after_normalization() {
        let payload = json!({"z": 1, "a": [1, 2, {"x": true}]});
        let first = normalize(&infer(&payload));
        let second = normalize(&infer(&payload));
        assert_eq!(first, second);
    }
}
