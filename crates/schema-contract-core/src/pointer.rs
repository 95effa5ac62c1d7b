//! RFC 6901–style pointer helpers plus the three reserved sentinel tokens.
//!
//! Pointers are plain strings internally (e.g. `"/obj/name"`, `"/arr/ITEMS"`,
//! `"/tup/TUPLE_ITEMS/0"`), with the root represented as `""`. The sentinel tokens below
//! are literal path segments reserved by this system; a schema property genuinely named
//! `ITEMS`, `TUPLE_ITEMS`, or `AP` will collide with them (see DESIGN.md).

use std::borrow::Cow;

pub const ITEMS: &str = "ITEMS";
pub const TUPLE_ITEMS: &str = "TUPLE_ITEMS";
pub const AP: &str = "AP";

/// Escape a single pointer segment per RFC 6901 (`~` -> `~0`, `/` -> `~1`, in that order).
pub fn escape_token(token: &str) -> Cow<'_, str> {
    if token.contains('~') || token.contains('/') {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Reverse of [`escape_token`].
pub fn unescape_token(token: &str) -> Cow<'_, str> {
    if token.contains("~0") || token.contains("~1") {
        Cow::Owned(token.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Build a child pointer by appending an already-decided token (escaped if it is a real
/// property name; sentinel tokens and numeric tuple indices need no escaping).
pub fn push(parent: &str, token: &str) -> String {
    format!("{parent}/{}", escape_token(token))
}

/// The parent pointer of `pointer`, or `None` if `pointer` is the root.
pub fn parent(pointer: &str) -> Option<String> {
    if pointer.is_empty() {
        return None;
    }
    pointer.rfind('/').map(|idx| pointer[..idx].to_string())
}

/// The last raw (still-escaped) token of `pointer`, or `None` at the root.
pub fn last_token(pointer: &str) -> Option<&str> {
    if pointer.is_empty() {
        return None;
    }
    pointer.rfind('/').map(|idx| &pointer[idx + 1..])
}
