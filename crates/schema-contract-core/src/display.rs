//! Converts internal sentinel-token pointers into human-facing pointer form.

use crate::pointer::{AP, ITEMS, TUPLE_ITEMS};

/// `…/ITEMS` -> `…/*`, `…/TUPLE_ITEMS/<i>` -> `…/[<i>]`, `…/AP` -> `…/{additionalProperties}`.
/// Applied only at the boundary where a report's output strings are built; all internal
/// accumulation and sorting happens on the pointer form this function takes as input.
pub fn to_display(pointer: &str) -> String {
    if pointer.is_empty() {
        return "/".to_string();
    }
    let segments: Vec<&str> = pointer.split('/').skip(1).collect();
    let mut out = String::new();
    let mut i = 0;
    while i < segments.len() {
        match segments[i] {
            ITEMS => {
                out.push_str("/*");
                i += 1;
            }
            AP => {
                out.push_str("/{additionalProperties}");
                i += 1;
            }
            TUPLE_ITEMS if i + 1 < segments.len() => {
                out.push_str(&format!("/[{}]", segments[i + 1]));
                i += 2;
            }
            other => {
                out.push('/');
                out.push_str(other);
                i += 1;
            }
        }
    }
    out
}
