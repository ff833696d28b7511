//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use muninn::{
    MetadataFetcher, MetricLabels, Muninn, MuninnError, PrometheusFetcher, TypeaheadSession,
    telemetry,
};

// ============================================================================
// Scripted fetchers
// ============================================================================

struct StaticFetcher;

#[async_trait]
impl MetadataFetcher for StaticFetcher {
    async fn fetch_metric_names(&self) -> muninn::Result<Vec<String>> {
        Ok(vec!["http_requests".to_string()])
    }

    async fn fetch_metric_labels(&self, _metric: &str) -> muninn::Result<MetricLabels> {
        let mut values_by_key = IndexMap::new();
        values_by_key.insert("job".to_string(), vec!["api".to_string()]);
        Ok(MetricLabels {
            keys: vec!["job".to_string()],
            values_by_key,
        })
    }

    async fn fetch_label_values(&self, _key: &str) -> muninn::Result<Vec<String>> {
        Ok(vec!["api".to_string()])
    }
}

struct FailingFetcher;

#[async_trait]
impl MetadataFetcher for FailingFetcher {
    async fn fetch_metric_names(&self) -> muninn::Result<Vec<String>> {
        Err(MuninnError::Http("connection refused".to_string()))
    }

    async fn fetch_metric_labels(&self, _metric: &str) -> muninn::Result<MetricLabels> {
        Err(MuninnError::Http("connection refused".to_string()))
    }

    async fn fetch_label_values(&self, _key: &str) -> muninn::Result<Vec<String>> {
        Err(MuninnError::Http("connection refused".to_string()))
    }
}

fn session(fetcher: impl MetadataFetcher + 'static) -> TypeaheadSession {
    Muninn::builder()
        .fetcher(Arc::new(fetcher))
        .seed_metric_names(vec!["http_requests".to_string()])
        .on_error(|_| {})
        .build()
        .expect("builder with fetcher")
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a metric name and one label pair.
fn counter_labeled(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn typeahead_requests_are_counted_by_context() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let session = session(StaticFetcher);
        let _ = session.typeahead("http_requests{job=\"api\"}[", 25);
        let _ = session.typeahead("http_requests{job=\"api\"}[", 25);
        let _ = session.typeahead("", 0);
    });

    let snapshot = snapshotter.snapshot().into_vec();

    let range = counter_labeled(&snapshot, telemetry::TYPEAHEAD_TOTAL, "context", "range");
    assert_eq!(range, 2, "expected 2 range requests");

    let none = counter_labeled(&snapshot, telemetry::TYPEAHEAD_TOTAL, "context", "none");
    assert_eq!(none, 1, "expected 1 unclassified request");
}

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn completed_refresher_records_ok_status() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let session = session(StaticFetcher);
                let refresher = session
                    .typeahead("http_requests{", 14)
                    .refresher
                    .expect("labels not fetched yet");
                refresher.await;
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    let ok = counter_labeled(&snapshot, telemetry::REFRESH_TOTAL, "kind", "metric_labels");
    assert_eq!(ok, 1, "expected 1 label refresh");
    assert_eq!(
        counter_labeled(&snapshot, telemetry::REFRESH_TOTAL, "status", "ok"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_refresh_records_error_status() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let session = session(FailingFetcher);
                session.refresh_metric_names().await;
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    let errors = counter_labeled(&snapshot, telemetry::REFRESH_TOTAL, "status", "error");
    assert_eq!(errors, 1, "expected 1 failed refresh");
    assert_eq!(
        counter_labeled(&snapshot, telemetry::REFRESH_TOTAL, "kind", "metric_names"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn http_fetch_records_counter_and_duration() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let server = MockServer::start().await;
                Mock::given(method("GET"))
                    .and(path("/api/v1/label/__name__/values"))
                    .respond_with(ResponseTemplate::new(200).set_body_json(
                        serde_json::json!({"status": "success", "data": ["up"]}),
                    ))
                    .mount(&server)
                    .await;

                let fetcher = PrometheusFetcher::new(server.uri());
                fetcher.fetch_metric_names().await.expect("fetch names");
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    let count = counter_labeled(&snapshot, telemetry::FETCH_TOTAL, "status", "ok");
    assert_eq!(count, 1, "expected 1 fetch counter");
    assert!(
        has_histogram(&snapshot, telemetry::FETCH_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let session = session(StaticFetcher);
    let refresher = session
        .typeahead("http_requests{", 14)
        .refresher
        .expect("labels not fetched yet");
    refresher.await;
    let result = session.typeahead("http_requests{", 14);
    assert!(result.has_suggestions());
}
