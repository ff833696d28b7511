//! Structural analysis of partial queries.
//!
//! The classifier never inspects a concrete editor tree. It works against
//! the [`CursorScope`] capability interface; [`QueryScope`] is the built-in
//! implementation that derives the same structure from raw query text with
//! a shallow, tolerant scan. Hosts with their own document model (e.g. a
//! highlighter token tree) can implement [`CursorScope`] directly instead.

mod scope;
mod text;

pub use scope::QueryScope;
pub use text::{RATE_RANGES, clean_text};

use serde::{Deserialize, Serialize};

/// Structural class attached to the syntax zone wrapping the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    /// Range-vector brackets `[...]`.
    Range,
    /// Label-matcher braces `{...}`.
    Labels,
    /// Grouping parens headed by `by` / `without`.
    Aggregation,
    /// Argument parens of a known function or aggregation operator.
    Function,
    /// A label key inside a matcher.
    AttrName,
    /// A quoted label value inside a matcher.
    AttrValue,
    /// Any recognized token (the cursor is not in plain text).
    Token,
    /// A known metric name.
    Metric,
}

/// Cursor-local structural capabilities the classifier depends on.
pub trait CursorScope {
    /// Whether the zone wrapping the cursor carries `class`.
    fn has_class(&self, class: TokenClass) -> bool;

    /// Text of the nearest enclosing or anchoring node with `class`.
    fn find_ancestor(&self, class: TokenClass) -> Option<String>;

    /// Text of the nearest preceding sibling node with `class`.
    fn find_previous_sibling(&self, class: TokenClass) -> Option<String>;
}
