//! Suggestion shapes returned to the editor surface

use serde::{Deserialize, Serialize};

/// A single completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionItem {
    pub text: String,
}

impl SuggestionItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Wrap raw candidates as suggestion items, preserving order.
    pub fn wrap<I, S>(candidates: I) -> Vec<SuggestionItem>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        candidates.into_iter().map(SuggestionItem::new).collect()
    }
}

/// A labelled group of suggestions.
///
/// Item order is whatever the producer supplied (fetch order for metric
/// names, insertion order for label keys and values). No deduplication,
/// no sorting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionGroup {
    pub label: String,
    pub items: Vec<SuggestionItem>,
}

impl SuggestionGroup {
    pub fn new(label: impl Into<String>, items: Vec<SuggestionItem>) -> Self {
        Self {
            label: label.into(),
            items,
        }
    }

    /// Group raw candidates under a label.
    pub fn from_candidates<I, S>(label: &str, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(label, SuggestionItem::wrap(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_preserves_order_and_duplicates() {
        let items = SuggestionItem::wrap(["b", "a", "b"]);
        let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "a", "b"]);
    }

    #[test]
    fn group_label_passes_through_unchanged() {
        let group = SuggestionGroup::from_candidates("Label values", ["api", "web"]);
        assert_eq!(group.label, "Label values");
        assert_eq!(group.items.len(), 2);
        assert_eq!(group.items[0].text, "api");
    }
}
