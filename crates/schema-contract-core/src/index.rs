//! Depth-first schema walk producing a pointer -> `NodeInfo` map.

use crate::config::IndexOptions;
use crate::normalize::normalize;
use crate::pointer;
use crate::resolver;
use crate::types::{self, TypeSet};
use crate::compose;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Whether a node's `additionalProperties` keyword is absent, closed, open, or a subschema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditionalProperties {
    Absent,
    False,
    True,
    Schema(Value),
}

/// The normalized record stored per pointer in a schema index.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub pointer: String,
    pub type_set: TypeSet,
    pub required: bool,
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,
    pub additional_properties: AdditionalProperties,
    pub property_names_pattern: Option<String>,
    pub minimum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub content_encoding: Option<String>,
    pub content_media_type: Option<String>,
}

pub type Index = BTreeMap<String, NodeInfo>;

/// Build a pointer -> `NodeInfo` index for `schema`, using default resource bounds.
pub fn build_index(schema: &Value) -> Index {
    build_index_with_options(schema, IndexOptions::default())
}

pub fn build_index_with_options(schema: &Value, options: IndexOptions) -> Index {
    let root = normalize(schema);
    let mut index = BTreeMap::new();
    walk(&root, &root, String::new(), true, &mut index, 0, &options);
    index
}

#[allow(clippy::too_many_arguments)]
fn walk(root: &Value, raw_node: &Value, pointer: String, required: bool, index: &mut Index, depth: usize, options: &IndexOptions) {
    if depth > options.max_depth {
        debug!(%pointer, depth, "index walk depth guard tripped, truncating");
        return;
    }

    let resolved = resolver::resolve(root, raw_node);
    let type_set = types::extract_type(root, &resolved);
    let collapsed = compose::collapse(root, &resolved);

    let info = build_node_info(&pointer, &collapsed, type_set, required);
    let looks_like_object = looks_like_object(&collapsed);
    let looks_like_array = looks_like_array(&collapsed);
    index.insert(pointer.clone(), info);

    let Value::Object(obj) = &collapsed else {
        return;
    };

    if looks_like_object {
        let required_set: std::collections::BTreeSet<String> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();

        if let Some(Value::Object(props)) = obj.get("properties") {
            let mut keys: Vec<&String> = props.keys().collect();
            keys.sort();
            for key in keys {
                let child_pointer = pointer::push(&pointer, key);
                let child_required = required_set.contains(key);
                walk(root, &props[key], child_pointer, child_required, index, depth + 1, options);
            }
        }

        if let Some(ap) = obj.get("additionalProperties") {
            if ap.is_object() {
                let child_pointer = pointer::push(&pointer, pointer::AP);
                walk(root, ap, child_pointer, required, index, depth + 1, options);
            }
        }
    }

    if looks_like_array {
        match obj.get("items") {
            Some(items @ Value::Object(_)) => {
                let child_pointer = pointer::push(&pointer, pointer::ITEMS);
                walk(root, items, child_pointer, false, index, depth + 1, options);
            }
            Some(Value::Array(tuple_items)) => {
                let tuple_base = pointer::push(&pointer, pointer::TUPLE_ITEMS);
                for (i, item) in tuple_items.iter().enumerate() {
                    let child_pointer = pointer::push(&tuple_base, &i.to_string());
                    walk(root, item, child_pointer, false, index, depth + 1, options);
                }
            }
            _ => {}
        }
    }
}

fn looks_like_object(node: &Value) -> bool {
    let Value::Object(obj) = node else { return false };
    type_mentions(obj.get("type"), "object") || obj.contains_key("properties")
}

fn looks_like_array(node: &Value) -> bool {
    let Value::Object(obj) = node else { return false };
    type_mentions(obj.get("type"), "array") || obj.contains_key("items")
}

fn type_mentions(type_value: Option<&Value>, name: &str) -> bool {
    match type_value {
        Some(Value::String(s)) => s == name,
        Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some(name)),
        _ => false,
    }
}

fn build_node_info(pointer: &str, collapsed: &Value, type_set: TypeSet, required: bool) -> NodeInfo {
    let obj = collapsed.as_object();
    let get = |k: &str| obj.and_then(|o| o.get(k));

    NodeInfo {
        pointer: pointer.to_string(),
        type_set,
        required,
        enum_values: get("enum").and_then(Value::as_array).cloned(),
        const_value: get("const").cloned(),
        additional_properties: match get("additionalProperties") {
            None => AdditionalProperties::Absent,
            Some(Value::Bool(false)) => AdditionalProperties::False,
            Some(Value::Bool(true)) => AdditionalProperties::True,
            Some(v) if v.is_object() => AdditionalProperties::Schema(v.clone()),
            Some(_) => AdditionalProperties::Absent,
        },
        property_names_pattern: get("propertyNames")
            .and_then(|v| v.get("pattern"))
            .and_then(Value::as_str)
            .map(String::from),
        minimum: get("minimum").and_then(Value::as_f64),
        exclusive_minimum: get("exclusiveMinimum").and_then(Value::as_f64),
        maximum: get("maximum").and_then(Value::as_f64),
        exclusive_maximum: get("exclusiveMaximum").and_then(Value::as_f64),
        multiple_of: get("multipleOf").and_then(Value::as_f64),
        min_length: get("minLength").and_then(Value::as_u64),
        max_length: get("maxLength").and_then(Value::as_u64),
        min_items: get("minItems").and_then(Value::as_u64),
        max_items: get("maxItems").and_then(Value::as_u64),
        min_properties: get("minProperties").and_then(Value::as_u64),
        max_properties: get("maxProperties").and_then(Value::as_u64),
        pattern: get("pattern").and_then(Value::as_str).map(String::from),
        format: get("format").and_then(Value::as_str).map(String::from),
        content_encoding: get("contentEncoding").and_then(Value::as_str).map(String::from),
        content_media_type: get("contentMediaType").and_then(Value::as_str).map(String::from),
    }
}
