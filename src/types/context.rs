//! Cursor context classification

use serde::{Deserialize, Serialize};

/// Syntactic context the cursor sits in, resolved by classification.
///
/// `metric` is `None` when the surrounding selector is not anchored to a
/// known metric name; label data then comes from the unanchored scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CursorContext {
    /// Inside range-vector brackets (`[...]`).
    Range,
    /// Inside a label-matcher selector (`{...}`), key position.
    Labels { metric: Option<String> },
    /// Inside a label matcher, value position for `key`.
    LabelValues { metric: Option<String>, key: String },
    /// Inside an aggregation grouping clause (`by (...)` / `without (...)`).
    Aggregation { metric: String },
    /// Position where a metric name is expected.
    Metrics,
}

impl CursorContext {
    /// The metric this context is anchored to, if any.
    pub fn metric(&self) -> Option<&str> {
        match self {
            CursorContext::Labels { metric } | CursorContext::LabelValues { metric, .. } => {
                metric.as_deref()
            }
            CursorContext::Aggregation { metric } => Some(metric),
            CursorContext::Range | CursorContext::Metrics => None,
        }
    }

    /// Short lowercase tag, used as a telemetry label.
    pub fn tag(&self) -> &'static str {
        match self {
            CursorContext::Range => "range",
            CursorContext::Labels { .. } => "labels",
            CursorContext::LabelValues { .. } => "label_values",
            CursorContext::Aggregation { .. } => "aggregation",
            CursorContext::Metrics => "metrics",
        }
    }
}
