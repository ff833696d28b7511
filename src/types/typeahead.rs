//! Typeahead results and refresh descriptors

use serde::{Deserialize, Serialize};

use super::context::CursorContext;
use super::suggestion::SuggestionGroup;
use crate::session::Refresher;

/// A metadata bucket the classifier found missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefreshKind {
    /// Fetch all label keys and values for one metric.
    MetricLabels { metric: String },
    /// Fetch values for one label key in the unanchored scope.
    UnanchoredLabelValues { key: String },
}

impl RefreshKind {
    /// Short lowercase tag, used as a telemetry label.
    pub fn tag(&self) -> &'static str {
        match self {
            RefreshKind::MetricLabels { .. } => "metric_labels",
            RefreshKind::UnanchoredLabelValues { .. } => "unanchored_label_values",
        }
    }
}

/// Result of one typeahead request.
///
/// When `refresher` is present the suggestions are incomplete: await it,
/// then issue the same request again. Failures inside the refresher go to
/// the session's error channel, never to the awaiter.
#[derive(Debug)]
pub struct TypeaheadResult {
    /// Resolved cursor context; `None` when no rule matched or the input
    /// was malformed.
    pub context: Option<CursorContext>,
    /// Cleaned text prefix being typed at the cursor.
    pub prefix: String,
    /// Suggestion groups, in practice at most one per request.
    pub suggestions: Vec<SuggestionGroup>,
    /// Pending metadata fetch, if classification found a bucket missing.
    pub refresher: Option<Refresher>,
}

impl TypeaheadResult {
    /// True when any group carries at least one item.
    pub fn has_suggestions(&self) -> bool {
        self.suggestions.iter().any(|g| !g.items.is_empty())
    }
}
