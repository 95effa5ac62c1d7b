//! Effective type-set extraction: `type` (+ `nullable`), `anyOf`/`oneOf` union, and
//! `allOf` intersection, with `integer ⊂ number` subtyping throughout.

use crate::resolver;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

const NUMBER: &str = "number";
const INTEGER: &str = "integer";

/// The effective type of a node: no signal, a single name, or a set of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSet {
    Undefined,
    Single(String),
    Set(BTreeSet<String>),
}

impl TypeSet {
    pub fn from_set(mut set: BTreeSet<String>) -> Self {
        collapse_number_integer_union(&mut set);
        match set.len() {
            0 => TypeSet::Undefined,
            1 => TypeSet::Single(set.into_iter().next().unwrap()),
            _ => TypeSet::Set(set),
        }
    }

    pub fn as_set(&self) -> BTreeSet<String> {
        match self {
            TypeSet::Undefined => BTreeSet::new(),
            TypeSet::Single(s) => {
                let mut set = BTreeSet::new();
                set.insert(s.clone());
                set
            }
            TypeSet::Set(s) => s.clone(),
        }
    }

    /// The canonical JSON rendering used in diff annotations: a bare string for a single
    /// type, a sorted array for a set.
    pub fn to_json(&self) -> Value {
        match self {
            TypeSet::Undefined => Value::Null,
            TypeSet::Single(s) => Value::String(s.clone()),
            TypeSet::Set(set) => Value::Array(set.iter().cloned().map(Value::String).collect()),
        }
    }
}

/// A literal union set (explicit `type` array, `nullable`, or `anyOf`/`oneOf`) collapses a
/// redundant `{number, integer}` pairing to `{number}`: a node accepting `number` already
/// accepts every `integer` value, so naming both is redundant and the wider name is kept.
fn collapse_number_integer_union(set: &mut BTreeSet<String>) {
    if set.contains(NUMBER) && set.contains(INTEGER) {
        set.remove(INTEGER);
    }
}

/// Compute the effective type set of `node` (after resolving a local `$ref`, but *before*
/// `allOf` collapsing — collapsing consumes the `allOf` branches this function still needs
/// to read their type signal from).
pub fn extract_type(root: &Value, node: &Value) -> TypeSet {
    extract_type_visited(root, node, &HashSet::new())
}

/// `visited` carries the local `$ref` pointers already expanded along the current
/// `$ref`/`allOf` recursion chain, cloned (not shared) into each branch so that a cycle on
/// one branch never poisons an unrelated sibling branch that happens to name the same ref.
/// A branch that re-enters a pointer already on its own chain contributes no type signal,
/// mirroring `resolver::resolve`'s own per-chain cycle stop.
fn extract_type_visited(root: &Value, node: &Value, visited: &HashSet<String>) -> TypeSet {
    let mut visited = visited.clone();
    if let Some(r) = local_ref(node) {
        if !visited.insert(r) {
            return TypeSet::Undefined;
        }
    }

    let resolved = resolver::resolve(root, node);
    let Some(obj) = resolved.as_object() else {
        return TypeSet::Undefined;
    };

    if let Some(type_value) = obj.get("type") {
        let mut set = type_value_to_set(type_value);
        if obj.get("nullable") == Some(&Value::Bool(true)) {
            set.insert("null".to_string());
        }
        return TypeSet::from_set(set);
    }

    if let Some(Value::Array(branches)) = obj.get("anyOf").or_else(|| obj.get("oneOf")) {
        let mut union = BTreeSet::new();
        for branch in branches {
            union.extend(extract_type_visited(root, branch, &visited).as_set());
        }
        return TypeSet::from_set(union);
    }

    if let Some(Value::Array(branches)) = obj.get("allOf") {
        let mut acc: Option<BTreeSet<String>> = None;
        for branch in branches {
            let branch_set = extract_type_visited(root, branch, &visited).as_set();
            if branch_set.is_empty() {
                continue;
            }
            acc = Some(match acc {
                None => branch_set,
                Some(prev) => intersect_type_sets(&prev, &branch_set),
            });
        }
        return acc.map(TypeSet::from_set).unwrap_or(TypeSet::Undefined);
    }

    TypeSet::Undefined
}

/// The node's own local `$ref` pointer, if it has one.
fn local_ref(node: &Value) -> Option<String> {
    let r = node.as_object()?.get("$ref")?.as_str()?;
    r.starts_with('#').then(|| r.to_string())
}

fn type_value_to_set(value: &Value) -> BTreeSet<String> {
    match value {
        Value::String(s) => {
            let mut set = BTreeSet::new();
            set.insert(s.clone());
            set
        }
        Value::Array(items) => items.iter().filter_map(Value::as_str).map(String::from).collect(),
        _ => BTreeSet::new(),
    }
}

/// Intersect two type sets under `integer ⊂ number` subtyping: a `number` requirement is
/// satisfied by an `integer` value, so when intersecting, `number` is expanded to also
/// match an opposing `integer` before the raw intersection. If the raw intersection then
/// contains both names, `number` (the wider, now-redundant name) is dropped — the mirror
/// image of the union-collapse rule, because this direction narrows.
fn intersect_type_sets(a: &BTreeSet<String>, b: &BTreeSet<String>) -> BTreeSet<String> {
    let mut result: BTreeSet<String> = BTreeSet::new();
    for name in a {
        if b.contains(name) || (name == INTEGER && b.contains(NUMBER)) || (name == NUMBER && b.contains(INTEGER)) {
            result.insert(name.clone());
        }
    }
    for name in b {
        if a.contains(name) || (name == INTEGER && a.contains(NUMBER)) || (name == NUMBER && a.contains(INTEGER)) {
            result.insert(name.clone());
        }
    }
    if result.contains(NUMBER) && result.contains(INTEGER) {
        result.remove(NUMBER);
    }
    result
}
