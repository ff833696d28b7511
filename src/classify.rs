//! Cursor-context classification.
//!
//! The single decision point of the engine: given the cursor-local text
//! run, the structural classes attached to it, and the metadata cached so
//! far, decide what the user is typing and which suggestions apply. Runs
//! synchronously on every keystroke and never blocks; when a required
//! metadata bucket is absent it asks for a refresh instead of waiting.

use crate::cache::MetadataCache;
use crate::syntax::{CursorScope, RATE_RANGES, TokenClass, clean_text};
use crate::types::{CursorContext, RefreshKind, SuggestionGroup};

/// Label keys offered in an unanchored selector before anything better is
/// known. Merged with keys seen across fetched metrics, defaults first.
const DEFAULT_LABEL_KEYS: &[&str] = &["job", "instance"];

/// Outcome of one classification pass.
///
/// `refresh` names the metadata fetch that must complete before better
/// suggestions exist. The session layer turns it into a pending refresher;
/// the classifier itself stays synchronous and pure.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub context: Option<CursorContext>,
    pub prefix: String,
    pub suggestions: Vec<SuggestionGroup>,
    pub refresh: Option<RefreshKind>,
}

/// Classify the cursor position described by `text` (the cursor-local
/// run), `offset` (cursor position within it, in bytes), and `scope`.
///
/// Rules are priority-ordered and the first match wins. The ordering is
/// policy, not optimization: a position tagged both range and labels is a
/// range position, and an aggregation clause loses to a selector when
/// both classes are present.
pub fn classify(
    text: &str,
    offset: usize,
    scope: &dyn CursorScope,
    cache: &MetadataCache,
) -> Classification {
    if offset > text.len() || !text.is_char_boundary(offset) {
        return Classification::default();
    }
    let prefix = clean_text(&text[..offset]);

    if scope.has_class(TokenClass::Range) {
        return Classification {
            context: Some(CursorContext::Range),
            prefix,
            suggestions: vec![SuggestionGroup::from_candidates(
                "Range vector",
                RATE_RANGES.iter().copied(),
            )],
            refresh: None,
        };
    }

    if scope.has_class(TokenClass::Labels) {
        return match scope.find_ancestor(TokenClass::Metric) {
            Some(metric) => anchored_labels(text, prefix, metric, scope, cache),
            None => unanchored_labels(text, prefix, scope, cache),
        };
    }

    if let Some(metric) = scope.find_ancestor(TokenClass::Metric) {
        if scope.has_class(TokenClass::Aggregation) {
            return aggregation(prefix, metric, cache);
        }
    }

    let metrics_wanted = (cache.has_metric_names()
        && ((!prefix.is_empty() && !scope.has_class(TokenClass::Token))
            || contains_operator(text)))
        || scope.has_class(TokenClass::Function);
    if metrics_wanted {
        return Classification {
            context: Some(CursorContext::Metrics),
            prefix,
            suggestions: vec![SuggestionGroup::from_candidates(
                "Metrics",
                cache.metric_names().iter().cloned(),
            )],
            refresh: None,
        };
    }

    Classification {
        prefix,
        ..Classification::default()
    }
}

/// Selector anchored to a known metric: label keys, or label values once
/// the typed text says the cursor is past a matcher operator.
fn anchored_labels(
    text: &str,
    prefix: String,
    metric: String,
    scope: &dyn CursorScope,
    cache: &MetadataCache,
) -> Classification {
    if !cache.has_label_keys(&metric) {
        return Classification {
            context: Some(CursorContext::Labels {
                metric: Some(metric.clone()),
            }),
            prefix,
            suggestions: Vec::new(),
            refresh: Some(RefreshKind::MetricLabels { metric }),
        };
    }

    if value_position(text, scope) {
        let Some(key) = scope.find_previous_sibling(TokenClass::AttrName) else {
            return Classification {
                prefix,
                ..Classification::default()
            };
        };
        // Keys and values for a metric are installed together, so a
        // missing value entry here means the install was bypassed.
        let values = cache.label_values(&metric, &key);
        debug_assert!(
            values.is_some(),
            "label values missing for cached metric {metric} key {key}"
        );
        let suggestions = match values {
            Some(values) => vec![SuggestionGroup::from_candidates(
                "Label values",
                values.iter().cloned(),
            )],
            None => {
                tracing::error!(metric, key, "label values absent for fetched metric");
                Vec::new()
            }
        };
        return Classification {
            context: Some(CursorContext::LabelValues {
                metric: Some(metric),
                key,
            }),
            prefix,
            suggestions,
            refresh: None,
        };
    }

    let keys = cache.label_keys(&metric).unwrap_or_default();
    Classification {
        context: Some(CursorContext::Labels {
            metric: Some(metric),
        }),
        prefix,
        suggestions: vec![SuggestionGroup::from_candidates(
            "Labels",
            keys.iter().cloned(),
        )],
        refresh: None,
    }
}

/// Selector with no recognizable metric: offer default keys merged with
/// everything seen so far, and fetch values one key at a time.
fn unanchored_labels(
    text: &str,
    prefix: String,
    scope: &dyn CursorScope,
    cache: &MetadataCache,
) -> Classification {
    if value_position(text, scope) {
        let Some(key) = scope.find_previous_sibling(TokenClass::AttrName) else {
            return Classification {
                prefix,
                ..Classification::default()
            };
        };
        if let Some(values) = cache.unanchored_label_values(&key) {
            return Classification {
                context: Some(CursorContext::LabelValues { metric: None, key }),
                prefix,
                suggestions: vec![SuggestionGroup::from_candidates(
                    "Label values",
                    values.iter().cloned(),
                )],
                refresh: None,
            };
        }
        return Classification {
            context: Some(CursorContext::LabelValues {
                metric: None,
                key: key.clone(),
            }),
            prefix,
            suggestions: Vec::new(),
            refresh: Some(RefreshKind::UnanchoredLabelValues { key }),
        };
    }

    Classification {
        context: Some(CursorContext::Labels { metric: None }),
        prefix,
        suggestions: vec![SuggestionGroup::from_candidates(
            "Labels",
            candidate_label_keys(cache),
        )],
        refresh: None,
    }
}

/// Grouping clause of an aggregation: suggest the anchoring metric's keys.
fn aggregation(prefix: String, metric: String, cache: &MetadataCache) -> Classification {
    let context = Some(CursorContext::Aggregation {
        metric: metric.clone(),
    });
    match cache.label_keys(&metric) {
        Some(keys) => Classification {
            context,
            prefix,
            suggestions: vec![SuggestionGroup::from_candidates(
                "Labels",
                keys.iter().cloned(),
            )],
            refresh: None,
        },
        None => Classification {
            context,
            prefix,
            suggestions: Vec::new(),
            refresh: Some(RefreshKind::MetricLabels { metric }),
        },
    }
}

/// True when the typed text puts the cursor in value position: right
/// after a matcher operator, or inside the value string itself.
fn value_position(text: &str, scope: &dyn CursorScope) -> bool {
    text.starts_with('=') || scope.has_class(TokenClass::AttrValue)
}

fn contains_operator(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '+' | '-' | '*' | '/' | '^' | '%'))
}

fn candidate_label_keys(cache: &MetadataCache) -> Vec<String> {
    let mut keys: Vec<String> = DEFAULT_LABEL_KEYS.iter().map(|s| s.to_string()).collect();
    for key in cache.known_label_keys() {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
