//! Consumer-oriented diff engine for JSON Schema producer changes.
//!
//! The three public operations are pure, total functions of their inputs: [`infer`] derives
//! a schema from a sample payload, [`normalize`] rewrites a schema into this crate's
//! canonical form, and [`diff`] compares a baseline schema against a "next" schema and
//! classifies every difference as breaking or non-breaking for a consumer.

mod canonical;
mod compose;
mod config;
mod diff;
mod display;
mod index;
mod infer;
mod normalize;
mod pointer;
mod resolver;
mod types;

pub use config::IndexOptions;
pub use diff::{BreakingFindings, DiffReport, NonBreakingFindings};
pub use index::{AdditionalProperties, Index, NodeInfo};
pub use types::TypeSet;

use serde_json::Value;

/// Derive a best-effort JSON Schema describing `payload`, normalized into canonical form.
pub fn infer(payload: &Value) -> Value {
    normalize::normalize(&infer::infer(payload))
}

/// Rewrite `schema` into canonical form (sorted `properties`/`required`, `required: true`
/// hints promoted into the parent's `required` array).
pub fn normalize(schema: &Value) -> Value {
    normalize::normalize(schema)
}

/// Compare `base_schema` against `next_schema` and classify every pointer-level difference.
pub fn diff(base_schema: &Value, next_schema: &Value) -> DiffReport {
    diff::diff(base_schema, next_schema)
}

/// Build a pointer -> [`NodeInfo`] index for `schema` using default resource bounds.
pub fn build_index(schema: &Value) -> Index {
    index::build_index(schema)
}

/// As [`build_index`], with caller-supplied resource bounds.
pub fn build_index_with_options(schema: &Value, options: IndexOptions) -> Index {
    index::build_index_with_options(schema, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn diffing_a_schema_against_itself_is_never_breaking() {
        let schema = json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "string"}}
            }
        });
        assert_eq!(diff(&schema, &schema).breaking_count, 0);
    }

    #[test]
    fn inferring_the_same_payload_twice_never_reports_breaking_changes() {
        let payload = json!({"id": "abc", "count": 3, "tags": ["a", "b"]});
        let base = infer(&payload);
        let next = infer(&payload);
        assert_eq!(diff(&base, &next).breaking_count, 0);
    }

    #[test]
    fn normalize_is_idempotent_through_the_public_api() {
        let schema = json!({
            "type": "object",
            "properties": {"id": {"type": "string", "required": true}}
        });
        let once = normalize(&schema);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            ".*".prop_map(Value::from),
        ]
    }

    fn arb_payload() -> impl Strategy<Value = Value> {
        arb_scalar().prop_recursive(3, 16, 8, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
                proptest::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn diffing_any_schema_against_itself_is_never_breaking(v in arb_payload()) {
            let schema = infer(&v);
            prop_assert_eq!(diff(&schema, &schema).breaking_count, 0);
        }

        #[test]
        fn normalize_is_idempotent_for_any_inferred_schema(v in arb_payload()) {
            let once = infer(&v);
            let twice = normalize(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
