//! Pairs baseline and next schema indexes by pointer and classifies the differences under
//! consumer-oriented semantics: widening breaks, narrowing is safe.

use crate::display;
use crate::index::{self, AdditionalProperties, Index, NodeInfo};
use crate::pointer;
use crate::types::TypeSet;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakingFindings {
    pub removed_required: Vec<String>,
    pub required_became_optional: Vec<String>,
    pub type_changed: Vec<String>,
    pub constraints_changed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonBreakingFindings {
    pub added: Vec<String>,
    pub removed_optional: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub breaking: BreakingFindings,
    pub non_breaking: NonBreakingFindings,
    pub breaking_count: usize,
}

/// An internal (pre-display) finding: the pointer it is anchored to (used for sorting) and
/// an optional human-readable reason rendered alongside it.
struct Finding {
    pointer: String,
    reason: Option<String>,
}

impl Finding {
    fn plain(pointer: String) -> Self {
        Finding { pointer, reason: None }
    }

    fn annotated(pointer: String, reason: String) -> Self {
        Finding { pointer, reason: Some(reason) }
    }

    fn render(self) -> String {
        let display_pointer = display::to_display(&self.pointer);
        match self.reason {
            None => display_pointer,
            Some(reason) => format!("{display_pointer} ({reason})"),
        }
    }
}

fn render_sorted(mut findings: Vec<Finding>) -> Vec<String> {
    findings.sort_by(|a, b| a.pointer.cmp(&b.pointer));
    findings.into_iter().map(Finding::render).collect()
}

/// Compare `base_schema` and `next_schema`, returning a sorted, deterministic report.
pub fn diff(base_schema: &Value, next_schema: &Value) -> DiffReport {
    let base = index::build_index(base_schema);
    let next = index::build_index(next_schema);
    diff_indexes(&base, &next)
}

fn diff_indexes(base: &Index, next: &Index) -> DiffReport {
    let mut removed_required = Vec::new();
    let mut required_became_optional = Vec::new();
    let mut type_changed = Vec::new();
    let mut constraints_changed = Vec::new();
    let mut added = Vec::new();
    let mut removed_optional = Vec::new();

    for (ptr, base_info) in base {
        // `/AP` pointers describe an `additionalProperties` subschema, not a concrete field:
        // its `required` flag only mirrors the parent's, so presence/absence here must never
        // be read as a property appearing or disappearing.
        let is_additional_properties_node = pointer::last_token(ptr) == Some(pointer::AP);

        match next.get(ptr) {
            None => {
                if is_additional_properties_node {
                    // silent: an inferred next schema never declares additionalProperties
                } else if base_info.required {
                    removed_required.push(Finding::plain(ptr.clone()));
                } else if parent_is_closed_object(next, ptr) {
                    removed_optional.push(Finding::plain(ptr.clone()));
                }
            }
            Some(next_info) => {
                if !is_additional_properties_node && base_info.required && !next_info.required {
                    required_became_optional.push(Finding::plain(ptr.clone()));
                }
                if let Some((base_type, next_type)) = breaking_type_change(base_info, next_info) {
                    let reason = format!(
                        "{} -> {}",
                        serde_json::to_string(&base_type).unwrap_or_default(),
                        serde_json::to_string(&next_type).unwrap_or_default()
                    );
                    type_changed.push(Finding::annotated(ptr.clone(), reason));
                }
                for reason in breaking_constraint_changes(base_info, next_info) {
                    constraints_changed.push(Finding::annotated(ptr.clone(), reason));
                }
            }
        }
    }

    for (ptr, next_info) in next {
        if base.contains_key(ptr) {
            continue;
        }
        if pointer::last_token(ptr) == Some(pointer::AP) {
            continue;
        }

        let Some(parent_ptr) = pointer::parent(ptr) else {
            added.push(Finding::plain(ptr.clone()));
            continue;
        };
        let Some(base_parent) = base.get(&parent_ptr) else {
            added.push(Finding::plain(ptr.clone()));
            continue;
        };

        // `/AP` pointers were already filtered out above; a tuple element's own parent
        // pointer (`<base>/TUPLE_ITEMS`) is never indexed, so the lookup above already sent
        // any tuple-position addition through the `added` fallback. What's left here is
        // either a real property key or an array-items addition.
        let is_real_property = pointer::last_token(ptr) != Some(pointer::ITEMS);

        if base_parent.additional_properties == AdditionalProperties::False && is_real_property {
            let reason = format!("added under closed object {}", display::to_display(&parent_ptr));
            constraints_changed.push(Finding::annotated(ptr.clone(), reason));
            continue;
        }

        if let AdditionalProperties::Schema(_) = &base_parent.additional_properties {
            let ap_pointer = pointer::push(&parent_ptr, pointer::AP);
            if let Some(ap_info) = base.get(&ap_pointer) {
                if let Some((ap_type, next_type)) = breaking_type_change(ap_info, next_info) {
                    let reason = format!(
                        "added key violates additionalProperties schema: {} -> {}",
                        serde_json::to_string(&ap_type).unwrap_or_default(),
                        serde_json::to_string(&next_type).unwrap_or_default()
                    );
                    constraints_changed.push(Finding::annotated(ptr.clone(), reason));
                    continue;
                }
            }
        }

        added.push(Finding::plain(ptr.clone()));
    }

    let breaking = BreakingFindings {
        removed_required: render_sorted(removed_required),
        required_became_optional: render_sorted(required_became_optional),
        type_changed: render_sorted(type_changed),
        constraints_changed: render_sorted(constraints_changed),
    };
    let non_breaking = NonBreakingFindings {
        added: render_sorted(added),
        removed_optional: render_sorted(removed_optional),
    };
    let breaking_count = breaking.removed_required.len()
        + breaking.required_became_optional.len()
        + breaking.type_changed.len()
        + breaking.constraints_changed.len();

    if breaking_count > 0 {
        debug!(breaking_count, "diff produced breaking changes");
    }

    DiffReport { breaking, non_breaking, breaking_count }
}

fn parent_is_closed_object(index: &Index, ptr: &str) -> bool {
    match pointer::parent(ptr) {
        Some(parent_ptr) => index
            .get(&parent_ptr)
            .map(|info| info.additional_properties == AdditionalProperties::False)
            .unwrap_or(false),
        None => false,
    }
}

/// §4.8.1: breaking iff any member of `next`'s type set is not allowed by `base`'s,
/// treating `integer` as allowed whenever `base` allows `number`.
fn breaking_type_change(base: &NodeInfo, next: &NodeInfo) -> Option<(Value, Value)> {
    match (&base.type_set, &next.type_set) {
        (TypeSet::Undefined, _) => None,
        (b, TypeSet::Undefined) => {
            if base.required {
                Some((b.to_json(), Value::Null))
            } else {
                None
            }
        }
        (b, n) => {
            let base_set = b.as_set();
            let breaking = n.as_set().iter().any(|member| !is_allowed(member, &base_set));
            if breaking {
                Some((b.to_json(), n.to_json()))
            } else {
                None
            }
        }
    }
}

fn is_allowed(member: &str, base_set: &std::collections::BTreeSet<String>) -> bool {
    base_set.contains(member) || (member == "integer" && base_set.contains("number"))
}

fn breaking_constraint_changes(base: &NodeInfo, next: &NodeInfo) -> Vec<String> {
    let mut reasons = Vec::new();

    check_enum_and_const(base, next, &mut reasons);
    check_additional_properties(base, next, &mut reasons);
    check_numeric_bounds(base, next, &mut reasons);
    check_multiple_of(base, next, &mut reasons);
    check_length_and_count_bounds(base, next, &mut reasons);
    check_string_constraints(base, next, &mut reasons);

    reasons
}

fn check_enum_and_const(base: &NodeInfo, next: &NodeInfo, reasons: &mut Vec<String>) {
    if let Some(base_enum) = &base.enum_values {
        let base_canon: std::collections::HashSet<String> =
            base_enum.iter().map(crate::canonical::canonicalize).collect();
        if let Some(next_enum) = &next.enum_values {
            if next_enum
                .iter()
                .any(|v| !base_canon.contains(&crate::canonical::canonicalize(v)))
            {
                reasons.push("enum widened".to_string());
            }
        } else if let Some(next_const) = &next.const_value {
            if !base_canon.contains(&crate::canonical::canonicalize(next_const)) {
                reasons.push("enum widened".to_string());
            }
        }
    }

    if let Some(base_const) = &base.const_value {
        let base_canon = crate::canonical::canonicalize(base_const);
        if let Some(next_const) = &next.const_value {
            if crate::canonical::canonicalize(next_const) != base_canon {
                reasons.push("const changed".to_string());
            }
        } else if let Some(next_enum) = &next.enum_values {
            if next_enum
                .iter()
                .any(|v| crate::canonical::canonicalize(v) != base_canon)
            {
                reasons.push("const widened".to_string());
            }
        }
    }
}

fn check_additional_properties(base: &NodeInfo, next: &NodeInfo, reasons: &mut Vec<String>) {
    match (&base.additional_properties, &next.additional_properties) {
        (AdditionalProperties::False, AdditionalProperties::True)
        | (AdditionalProperties::False, AdditionalProperties::Schema(_)) => {
            reasons.push("additionalProperties opened".to_string());
        }
        (AdditionalProperties::Schema(_), AdditionalProperties::True) => {
            reasons.push("additionalProperties schema loosened".to_string());
        }
        _ => {}
    }
}

/// Effective (value, is_exclusive) bound: when both `minimum`/`exclusiveMinimum` (or the
/// maximum pair) are present, the stricter one binds.
fn effective_lower(info: &NodeInfo) -> Option<(f64, bool)> {
    combine_bound(info.minimum, info.exclusive_minimum, true)
}

fn effective_upper(info: &NodeInfo) -> Option<(f64, bool)> {
    combine_bound(info.maximum, info.exclusive_maximum, false)
}

fn combine_bound(inclusive: Option<f64>, exclusive: Option<f64>, lower: bool) -> Option<(f64, bool)> {
    match (inclusive, exclusive) {
        (Some(i), Some(e)) => {
            let exclusive_is_stricter = if lower { e >= i } else { e <= i };
            if exclusive_is_stricter {
                Some((e, true))
            } else {
                Some((i, false))
            }
        }
        (Some(i), None) => Some((i, false)),
        (None, Some(e)) => Some((e, true)),
        (None, None) => None,
    }
}

fn format_bound(bound: (f64, bool)) -> String {
    if bound.1 {
        format!("{} (exclusive)", bound.0)
    } else {
        bound.0.to_string()
    }
}

fn check_numeric_bounds(base: &NodeInfo, next: &NodeInfo, reasons: &mut Vec<String>) {
    if let (Some(b), Some(n)) = (effective_lower(base), effective_lower(next)) {
        let loosened = n.0 < b.0 || (n.0 == b.0 && b.1 && !n.1);
        if loosened {
            reasons.push(format!("minimum loosened ({} -> {})", format_bound(b), format_bound(n)));
        }
    }
    if let (Some(b), Some(n)) = (effective_upper(base), effective_upper(next)) {
        let loosened = n.0 > b.0 || (n.0 == b.0 && b.1 && !n.1);
        if loosened {
            reasons.push(format!("maximum loosened ({} -> {})", format_bound(b), format_bound(n)));
        }
    }
}

fn check_multiple_of(base: &NodeInfo, next: &NodeInfo, reasons: &mut Vec<String>) {
    if let (Some(b), Some(n)) = (base.multiple_of, next.multiple_of) {
        if (n - b).abs() > f64::EPSILON {
            let ratio = n / b;
            let is_multiple = ratio.is_finite() && (ratio - ratio.round()).abs() < 1e-9 && ratio.round() >= 1.0;
            if !is_multiple {
                reasons.push("multipleOf changed".to_string());
            }
        }
    }
}

fn check_length_and_count_bounds(base: &NodeInfo, next: &NodeInfo, reasons: &mut Vec<String>) {
    macro_rules! max_loosened {
        ($field:ident, $name:literal) => {
            if let (Some(b), Some(n)) = (base.$field, next.$field) {
                if n > b {
                    reasons.push(format!("{} loosened ({} -> {})", $name, b, n));
                }
            }
        };
    }
    macro_rules! min_loosened {
        ($field:ident, $name:literal) => {
            if let (Some(b), Some(n)) = (base.$field, next.$field) {
                if n < b {
                    reasons.push(format!("{} loosened ({} -> {})", $name, b, n));
                }
            }
        };
    }
    max_loosened!(max_length, "maxLength");
    max_loosened!(max_items, "maxItems");
    max_loosened!(max_properties, "maxProperties");
    min_loosened!(min_length, "minLength");
    min_loosened!(min_items, "minItems");
    min_loosened!(min_properties, "minProperties");
}

fn check_string_constraints(base: &NodeInfo, next: &NodeInfo, reasons: &mut Vec<String>) {
    macro_rules! changed {
        ($field:ident, $name:literal) => {
            if let (Some(b), Some(n)) = (&base.$field, &next.$field) {
                if b != n {
                    reasons.push(format!("{} changed", $name));
                }
            }
        };
    }
    changed!(pattern, "pattern");
    changed!(format, "format");
    changed!(content_encoding, "contentEncoding");
    changed!(content_media_type, "contentMediaType");
    changed!(property_names_pattern, "propertyNames.pattern");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn identical_schemas_never_produce_breaking_changes() {
        let schema = json!({
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "string"}, "nested": {"type": "object", "required": ["x"], "properties": {"x": {"type": "number"}}}}
        });
        let report = diff(&schema, &schema);
        assert_eq!(report.breaking_count, 0);
        assert!(report.breaking.removed_required.is_empty());
        assert!(report.breaking.required_became_optional.is_empty());
        assert!(report.breaking.type_changed.is_empty());
        assert!(report.breaking.constraints_changed.is_empty());
    }

    #[test]
    fn scenario_removed_required() {
        let base = json!({
            "type": "object",
            "required": ["id", "nested"],
            "properties": {"id": {"type": "string"}, "nested": {"type": "object"}}
        });
        let next = json!({
            "type": "object",
            "required": ["nested"],
            "properties": {"nested": {"type": "object"}}
        });
        let report = diff(&base, &next);
        assert_eq!(report.breaking.removed_required, vec!["/id"]);
        assert_eq!(report.breaking_count, 1);
    }

    #[test]
    fn scenario_required_became_optional() {
        let base = json!({
            "type": "object",
            "required": ["id", "nested"],
            "properties": {"id": {"type": "string"}, "nested": {"type": "object"}}
        });
        let next = json!({
            "type": "object",
            "required": ["nested"],
            "properties": {"id": {"type": "string"}, "nested": {"type": "object"}}
        });
        let report = diff(&base, &next);
        assert_eq!(report.breaking.required_became_optional, vec!["/id"]);
    }

    #[test]
    fn scenario_type_change_no_overlap() {
        let base = json!({
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "string"}}
        });
        let next = json!({
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "number"}}
        });
        let report = diff(&base, &next);
        assert_eq!(report.breaking.type_changed.len(), 1);
        assert!(report.breaking.type_changed[0].starts_with("/id "));
    }

    #[test]
    fn scenario_closed_object_addition() {
        let base = json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["a", "b"],
            "properties": {"a": {"type": "string"}, "b": {"type": "string"}}
        });
        let next = crate::infer::infer(&json!({"b": "ok", "c": "new"}));
        let report = diff(&base, &next);
        assert_eq!(report.breaking.removed_required, vec!["/a"]);
        assert!(report.breaking.constraints_changed.iter().any(|s| s.starts_with("/c (added under closed object /")));
        let mut breaking_pointers: Vec<String> = report
            .breaking
            .removed_required
            .iter()
            .cloned()
            .chain(report.breaking.constraints_changed.iter().map(|s| s.split(' ').next().unwrap().to_string()))
            .collect();
        breaking_pointers.sort();
        assert_eq!(breaking_pointers, vec!["/a", "/c"]);
    }

    #[test]
    fn scenario_integer_to_number_is_non_breaking_reverse_is_breaking() {
        let number_schema = json!({"type": "object", "properties": {"amount": {"type": "number"}}});
        let integer_schema = json!({"type": "object", "properties": {"amount": {"type": "integer"}}});

        let widening_safe = diff(&number_schema, &integer_schema);
        assert_eq!(widening_safe.breaking_count, 0);

        let narrowing_unsafe = diff(&integer_schema, &number_schema);
        assert_eq!(narrowing_unsafe.breaking.type_changed.len(), 1);
        assert!(narrowing_unsafe.breaking.type_changed[0].starts_with("/amount"));
    }

    #[test]
    fn scenario_array_item_widening() {
        let base = json!({"type": "object", "properties": {"arr": {"type": "array", "items": {"type": "string"}}}});
        let next = json!({"type": "object", "properties": {"arr": {"type": "array", "items": {"type": ["string", "null"]}}}});
        let report = diff(&base, &next);
        assert_eq!(report.breaking.type_changed.len(), 1);
        assert!(report.breaking.type_changed[0].starts_with("/arr/*"));
    }

    #[test]
    fn enum_widening_is_breaking_narrowing_is_not() {
        let base = json!({"type": "object", "properties": {"status": {"enum": ["a", "b"]}}});
        let widened = json!({"type": "object", "properties": {"status": {"enum": ["a", "b", "c"]}}});
        let narrowed = json!({"type": "object", "properties": {"status": {"enum": ["a"]}}});

        assert_eq!(diff(&base, &widened).breaking.constraints_changed, vec!["/status (enum widened)"]);
        assert!(diff(&base, &narrowed).breaking.constraints_changed.is_empty());
    }

    #[test]
    fn maximum_and_max_length_loosening_are_two_distinct_entries() {
        let base = json!({"type": "object", "properties": {"n": {"type": "number", "maximum": 10}, "s": {"type": "string", "maxLength": 4}}});
        let next = json!({"type": "object", "properties": {"n": {"type": "number", "maximum": 20}, "s": {"type": "string", "maxLength": 8}}});
        let report = diff(&base, &next);
        assert_eq!(report.breaking.constraints_changed.len(), 2);
    }

    #[test]
    fn exclusive_to_inclusive_lower_bound_loosening_is_breaking() {
        let base = json!({"type": "object", "properties": {"n": {"type": "number", "exclusiveMinimum": 0}}});
        let next = json!({"type": "object", "properties": {"n": {"type": "number", "minimum": 0}}});
        let report = diff(&base, &next);
        assert_eq!(report.breaking.constraints_changed.len(), 1);
        assert!(report.breaking.constraints_changed[0].contains("minimum loosened"));
    }

    #[test]
    fn multiple_of_narrowing_is_safe_widening_is_breaking() {
        let base = json!({"type": "object", "properties": {"n": {"type": "number", "multipleOf": 2}}});
        let narrowed = json!({"type": "object", "properties": {"n": {"type": "number", "multipleOf": 4}}});
        let widened = json!({"type": "object", "properties": {"n": {"type": "number", "multipleOf": 3}}});

        assert!(diff(&base, &narrowed).breaking.constraints_changed.is_empty());
        assert_eq!(diff(&base, &widened).breaking.constraints_changed, vec!["/n (multipleOf changed)"]);
    }

    #[test]
    fn additional_properties_subschema_violation_is_flagged() {
        let base = json!({"type": "object", "additionalProperties": {"type": "string"}});
        let next = crate::infer::infer(&json!({"extra": 5}));
        let report = diff(&base, &next);
        assert_eq!(report.breaking.constraints_changed.len(), 1);
        assert!(report.breaking.constraints_changed[0].starts_with("/extra ("));
    }

    #[test]
    fn additional_properties_subschema_compatible_addition_is_non_breaking() {
        let base = json!({"type": "object", "additionalProperties": {"type": "string"}});
        let next = crate::infer::infer(&json!({"extra": "ok"}));
        let report = diff(&base, &next);
        assert_eq!(report.breaking_count, 0);
        assert_eq!(report.non_breaking.added, vec!["/extra"]);
    }

    #[test]
    fn additional_properties_opening_from_false_is_breaking() {
        let base = json!({"type": "object", "additionalProperties": false});
        let next = json!({"type": "object", "additionalProperties": true});
        let report = diff(&base, &next);
        assert_eq!(report.breaking.constraints_changed, vec!["/ (additionalProperties opened)"]);
    }

    #[test]
    fn removing_an_inferred_optional_constraint_stays_silent_unless_closed() {
        let base = json!({"type": "object", "properties": {"a": {"type": "string", "pattern": "^x"}}});
        let next = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        let report = diff(&base, &next);
        assert_eq!(report.breaking_count, 0);
    }

    #[test]
    fn diff_output_lists_are_sorted() {
        let base = json!({"type": "object", "properties": {"z": {"type": "string"}, "a": {"type": "string"}}});
        let next = json!({"type": "object", "properties": {"z": {"type": "number"}, "a": {"type": "number"}}});
        let report = diff(&base, &next);
        let mut sorted = report.breaking.type_changed.clone();
        sorted.sort();
        assert_eq!(report.breaking.type_changed, sorted);
    }
}
