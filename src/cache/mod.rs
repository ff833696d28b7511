//! Session-scoped metadata store.
//!
//! Holds everything discovered about the metric namespace so far: the
//! ordered metric-name list, per-metric label keys, and per-metric label
//! values. Grows monotonically for the lifetime of an editing session.
//! Nothing is evicted or invalidated; stale-but-correct entries are
//! harmless because label metadata is only ever added.
//!
//! Absence is meaningful: a metric without a `label_keys` entry has not
//! been fetched yet, which is what tells the classifier to hand back a
//! refresher instead of suggestions. An empty key list means the fetch
//! completed and found nothing, so callers must check existence before
//! reading.

use indexmap::IndexMap;

/// Cache scope for label data not yet anchored to a specific metric.
pub const EMPTY_METRIC: &str = "";

/// Discovered metric metadata, keyed the way queries reference it.
///
/// Per-metric label keys and values are installed together, atomically
/// from a reader's point of view: `has_label_keys(m)` implies values for
/// every key of `m` are present too. The [`EMPTY_METRIC`] scope is the one
/// exception, its value map grows one key at a time.
#[derive(Debug, Clone, Default)]
pub struct MetadataCache {
    metric_names: Option<Vec<String>>,
    label_keys: IndexMap<String, Vec<String>>,
    label_values: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl MetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache seeded with a metric-name list the host already has.
    pub fn with_metric_names(names: Vec<String>) -> Self {
        Self {
            metric_names: Some(names),
            ..Self::default()
        }
    }

    /// Whether a metric-name fetch (or an external seed) has landed yet.
    pub fn has_metric_names(&self) -> bool {
        self.metric_names.is_some()
    }

    /// All known metric names, in fetch order. Empty until the first
    /// [`record_metric_names`](Self::record_metric_names).
    pub fn metric_names(&self) -> &[String] {
        self.metric_names.as_deref().unwrap_or_default()
    }

    /// Whether label metadata for `metric` has been installed.
    pub fn has_label_keys(&self, metric: &str) -> bool {
        self.label_keys.contains_key(metric)
    }

    /// Label keys for `metric`, in fetch order. `None` until installed.
    pub fn label_keys(&self, metric: &str) -> Option<&[String]> {
        self.label_keys.get(metric).map(Vec::as_slice)
    }

    /// Whether values for `(metric, key)` have been installed.
    pub fn has_label_values(&self, metric: &str, key: &str) -> bool {
        self.label_values
            .get(metric)
            .is_some_and(|values| values.contains_key(key))
    }

    /// Values for `(metric, key)`, in fetch order. `None` until installed.
    pub fn label_values(&self, metric: &str, key: &str) -> Option<&[String]> {
        self.label_values
            .get(metric)
            .and_then(|values| values.get(key))
            .map(Vec::as_slice)
    }

    /// Whether values for `key` exist in the [`EMPTY_METRIC`] scope.
    pub fn has_unanchored_label_values(&self, key: &str) -> bool {
        self.has_label_values(EMPTY_METRIC, key)
    }

    /// Values for `key` in the [`EMPTY_METRIC`] scope.
    pub fn unanchored_label_values(&self, key: &str) -> Option<&[String]> {
        self.label_values(EMPTY_METRIC, key)
    }

    /// Every label key seen across all fetched metrics, deduplicated in
    /// first-seen order.
    pub fn known_label_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for metric_keys in self.label_keys.values() {
            for key in metric_keys {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Replace the metric-name list wholesale. Later calls overwrite, they
    /// do not merge.
    pub fn record_metric_names(&mut self, names: Vec<String>) {
        self.metric_names = Some(names);
    }

    /// Install the key list and the full value map for `metric` in one
    /// step. Re-installing the same metric replaces its entry.
    pub fn record_metric_labels(
        &mut self,
        metric: impl Into<String>,
        keys: Vec<String>,
        values_by_key: IndexMap<String, Vec<String>>,
    ) {
        let metric = metric.into();
        self.label_values.insert(metric.clone(), values_by_key);
        self.label_keys.insert(metric, keys);
    }

    /// Install values for one key under the [`EMPTY_METRIC`] scope,
    /// leaving the scope's other keys untouched.
    pub fn record_unanchored_label_values(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.label_values
            .entry(EMPTY_METRIC.to_string())
            .or_default()
            .insert(key.into(), values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn absent_metric_has_no_keys() {
        let cache = MetadataCache::new();
        assert!(!cache.has_metric_names());
        assert!(!cache.has_label_keys("http_requests"));
        assert_eq!(cache.label_keys("http_requests"), None);
    }

    #[test]
    fn fetched_empty_key_list_is_distinct_from_absent() {
        let mut cache = MetadataCache::new();
        cache.record_metric_labels("up", vec![], IndexMap::new());
        assert!(cache.has_label_keys("up"));
        assert_eq!(cache.label_keys("up"), Some(&[][..]));
    }

    #[test]
    fn metric_names_are_replaced_wholesale() {
        let mut cache = MetadataCache::new();
        cache.record_metric_names(strings(&["a", "b"]));
        cache.record_metric_names(strings(&["c"]));
        assert_eq!(cache.metric_names(), &["c"]);
    }

    #[test]
    fn metric_labels_install_keys_and_values_together() {
        let mut cache = MetadataCache::new();
        let mut values = IndexMap::new();
        values.insert("job".to_string(), strings(&["api", "web"]));
        cache.record_metric_labels("http_requests", strings(&["job"]), values);

        assert!(cache.has_label_values("http_requests", "job"));
        assert_eq!(
            cache.label_values("http_requests", "job"),
            Some(&strings(&["api", "web"])[..])
        );
    }

    #[test]
    fn reinstalling_metric_labels_is_idempotent() {
        let mut cache = MetadataCache::new();
        let mut values = IndexMap::new();
        values.insert("job".to_string(), strings(&["api"]));
        cache.record_metric_labels("http_requests", strings(&["job"]), values.clone());
        cache.record_metric_labels("http_requests", strings(&["job"]), values);

        assert_eq!(cache.label_keys("http_requests"), Some(&strings(&["job"])[..]));
        assert_eq!(
            cache.label_values("http_requests", "job"),
            Some(&strings(&["api"])[..])
        );
    }

    #[test]
    fn seeded_cache_starts_with_names() {
        let cache = MetadataCache::with_metric_names(strings(&["up"]));
        assert!(cache.has_metric_names());
        assert_eq!(cache.metric_names(), &["up"]);
    }

    #[test]
    fn unanchored_values_accumulate_per_key() {
        let mut cache = MetadataCache::new();
        cache.record_unanchored_label_values("job", strings(&["api"]));
        cache.record_unanchored_label_values("instance", strings(&["host:9090"]));

        assert!(cache.has_unanchored_label_values("job"));
        assert!(cache.has_unanchored_label_values("instance"));
        assert!(cache.has_label_values(EMPTY_METRIC, "job"));
        assert_eq!(
            cache.unanchored_label_values("job"),
            Some(&strings(&["api"])[..])
        );
    }

    #[test]
    fn known_label_keys_dedup_in_first_seen_order() {
        let mut cache = MetadataCache::new();
        cache.record_metric_labels("a", strings(&["job", "instance"]), IndexMap::new());
        cache.record_metric_labels("b", strings(&["instance", "path"]), IndexMap::new());

        assert_eq!(cache.known_label_keys(), strings(&["job", "instance", "path"]));
    }
}
