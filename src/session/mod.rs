//! Editing-session facade.
//!
//! A [`TypeaheadSession`] owns the metadata cache for one editing session
//! and wires the pure classifier to a [`MetadataFetcher`]. Classification
//! itself runs synchronously on every call; the only suspension points are
//! the refreshers this module builds, which the host awaits before asking
//! again. Fetch failures flow to the session's error channel and never
//! into the classification path.

mod builder;
mod refresher;

pub use builder::{Muninn, MuninnBuilder};
pub use refresher::Refresher;

use std::fmt;
use std::sync::{Arc, RwLock};

use futures_util::future::BoxFuture;

use crate::MuninnError;
use crate::cache::MetadataCache;
use crate::classify::{Classification, classify};
use crate::fetch::MetadataFetcher;
use crate::syntax::{CursorScope, QueryScope};
use crate::telemetry;
use crate::types::{RefreshKind, TypeaheadResult};

/// Callback receiving fetch failures.
pub type ErrorCallback = Arc<dyn Fn(&MuninnError) + Send + Sync>;

/// Callback receiving the full metric-name list after each successful
/// metric-name install, for re-teaching an external highlighter.
pub type MetricNamesCallback = Arc<dyn Fn(&[String]) + Send + Sync>;

/// One editing session's typeahead engine.
///
/// Create via [`Muninn::builder()`]. Cheap to share: refreshers clone the
/// inner handles, so a session can outlive the calls that produced them.
///
/// # Example
///
/// ```ignore
/// use muninn::Muninn;
///
/// let session = Muninn::builder()
///     .prometheus_url("http://localhost:9090")
///     .build()?;
/// session.refresh_metric_names().await;
///
/// let mut result = session.typeahead("http_requests{", 14);
/// if let Some(refresher) = result.refresher.take() {
///     refresher.await;
///     result = session.typeahead("http_requests{", 14);
/// }
/// ```
pub struct TypeaheadSession {
    cache: Arc<RwLock<MetadataCache>>,
    fetcher: Arc<dyn MetadataFetcher>,
    on_error: Option<ErrorCallback>,
    on_metric_names: Option<MetricNamesCallback>,
}

impl TypeaheadSession {
    pub(crate) fn new(
        fetcher: Arc<dyn MetadataFetcher>,
        on_error: Option<ErrorCallback>,
        on_metric_names: Option<MetricNamesCallback>,
    ) -> Self {
        Self {
            cache: Arc::new(RwLock::new(MetadataCache::new())),
            fetcher,
            on_error,
            on_metric_names,
        }
    }

    /// Compute suggestions for the cursor at byte offset `cursor` in
    /// `query`, using the built-in query analyzer.
    ///
    /// Never blocks. When required metadata is missing, the result carries
    /// a [`Refresher`] and empty suggestions; await it and call again.
    pub fn typeahead(&self, query: &str, cursor: usize) -> TypeaheadResult {
        let classification = self.classify_with(|cache| {
            match QueryScope::analyze(query, cursor, cache.metric_names()) {
                Some(scope) => classify(scope.text(), scope.offset(), &scope, cache),
                None => Classification::default(),
            }
        });
        self.finish(classification)
    }

    /// Compute suggestions from a host-supplied cursor scope.
    ///
    /// For editors that already know the structure around the cursor:
    /// `text` is the cursor-local run and `offset` the cursor position
    /// within it, in bytes.
    pub fn typeahead_with_scope(
        &self,
        text: &str,
        offset: usize,
        scope: &dyn CursorScope,
    ) -> TypeaheadResult {
        let classification = self.classify_with(|cache| classify(text, offset, scope, cache));
        self.finish(classification)
    }

    /// Fetch the metric-name list and install it.
    ///
    /// Call once when the session starts, and again whenever the host
    /// wants fresher names. Failures go to the error channel like any
    /// refresher's.
    pub async fn refresh_metric_names(&self) {
        match self.fetcher.fetch_metric_names().await {
            Ok(names) => {
                self.install_metric_names(names);
                record_refresh("metric_names", true);
            }
            Err(error) => {
                report(&self.on_error, &error);
                record_refresh("metric_names", false);
            }
        }
    }

    /// Replace the metric-name list with one the hosting application
    /// already has, bypassing the fetcher.
    pub fn set_metric_names(&self, names: Vec<String>) {
        self.install_metric_names(names);
    }

    /// Metric names known so far, in fetch order.
    pub fn metric_names(&self) -> Vec<String> {
        self.cache
            .read()
            .map(|cache| cache.metric_names().to_vec())
            .unwrap_or_default()
    }

    /// Run a classification against the cache. A poisoned lock is reported
    /// through the error channel and classifies as nothing, so a panicked
    /// refresher cannot take the editing session down with it.
    fn classify_with(&self, run: impl FnOnce(&MetadataCache) -> Classification) -> Classification {
        match self.cache.read() {
            Ok(cache) => run(&cache),
            Err(e) => {
                report(
                    &self.on_error,
                    &MuninnError::Internal(format!("metadata cache lock poisoned: {e}")),
                );
                Classification::default()
            }
        }
    }

    fn install_metric_names(&self, names: Vec<String>) {
        if let Some(callback) = &self.on_metric_names {
            callback(&names);
        }
        write_cache(&self.cache, &self.on_error, |cache| {
            cache.record_metric_names(names);
        });
    }

    fn finish(&self, classification: Classification) -> TypeaheadResult {
        let context_tag = classification.context.as_ref().map_or("none", |c| c.tag());
        metrics::counter!(telemetry::TYPEAHEAD_TOTAL, "context" => context_tag).increment(1);
        let refresher = classification.refresh.map(|kind| self.refresher(kind));
        TypeaheadResult {
            context: classification.context,
            prefix: classification.prefix,
            suggestions: classification.suggestions,
            refresher,
        }
    }

    /// Build the pending fetch for a missing metadata bucket. Concurrent
    /// refreshers for the same bucket are not deduplicated; the atomic
    /// install makes duplicates wasteful but safe.
    fn refresher(&self, kind: RefreshKind) -> Refresher {
        let cache = Arc::clone(&self.cache);
        let fetcher = Arc::clone(&self.fetcher);
        let on_error = self.on_error.clone();
        let tag = kind.tag();
        let future: BoxFuture<'static, ()> = match kind.clone() {
            RefreshKind::MetricLabels { metric } => Box::pin(async move {
                match fetcher.fetch_metric_labels(&metric).await {
                    Ok(labels) => {
                        write_cache(&cache, &on_error, move |c| {
                            c.record_metric_labels(metric, labels.keys, labels.values_by_key);
                        });
                        record_refresh(tag, true);
                    }
                    Err(error) => {
                        report(&on_error, &error);
                        record_refresh(tag, false);
                    }
                }
            }),
            RefreshKind::UnanchoredLabelValues { key } => Box::pin(async move {
                match fetcher.fetch_label_values(&key).await {
                    Ok(values) => {
                        write_cache(&cache, &on_error, move |c| {
                            c.record_unanchored_label_values(key, values);
                        });
                        record_refresh(tag, true);
                    }
                    Err(error) => {
                        report(&on_error, &error);
                        record_refresh(tag, false);
                    }
                }
            }),
        };
        Refresher::new(kind, future)
    }
}

impl fmt::Debug for TypeaheadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeaheadSession").finish_non_exhaustive()
    }
}

/// Apply a cache mutation, routing a poisoned lock to the error channel
/// instead of panicking.
fn write_cache(
    cache: &Arc<RwLock<MetadataCache>>,
    on_error: &Option<ErrorCallback>,
    apply: impl FnOnce(&mut MetadataCache),
) {
    match cache.write() {
        Ok(mut guard) => apply(&mut guard),
        Err(e) => report(
            on_error,
            &MuninnError::Internal(format!("metadata cache lock poisoned: {e}")),
        ),
    }
}

fn report(on_error: &Option<ErrorCallback>, error: &MuninnError) {
    match on_error {
        Some(callback) => callback(error),
        None => tracing::error!(%error, "metadata fetch failed"),
    }
}

fn record_refresh(kind: &'static str, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(telemetry::REFRESH_TOTAL,
        "kind" => kind,
        "status" => status,
    )
    .increment(1);
}
