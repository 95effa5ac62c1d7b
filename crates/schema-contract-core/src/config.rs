//! Resource-bound configuration for the index walk and the value canonicalizer.

use serde::{Deserialize, Serialize};

/// Bounds the defensive recursion guards used while indexing a schema. The diff engine
/// itself is otherwise parameter-free (§5: a pure function of two schemas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct IndexOptions {
    /// Maximum `$ref`/`allOf`/property-descent depth before the walk truncates instead of
    /// recursing further.
    pub max_depth: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions { max_depth: 128 }
    }
}
