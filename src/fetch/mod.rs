//! Metadata fetching boundary.
//!
//! The engine depends on three fetch operations, implemented externally to
//! keep the classification path free of transport concerns. Implementations
//! unwrap whatever wire envelope their backend speaks and hand back plain
//! ordered lists shaped for the cache. Fetch failures surface through the
//! session's error channel, never into classification.

mod prometheus;

pub use prometheus::PrometheusFetcher;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::Result;

/// Label metadata for one metric, normalized for atomic installation:
/// the ordered key list plus the full per-key value map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricLabels {
    pub keys: Vec<String>,
    pub values_by_key: IndexMap<String, Vec<String>>,
}

/// Backend metadata source.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// All metric names known to the backend, in backend order.
    async fn fetch_metric_names(&self) -> Result<Vec<String>>;

    /// Label keys and values for one metric, fetched together.
    async fn fetch_metric_labels(&self, metric: &str) -> Result<MetricLabels>;

    /// Values for one label key, unscoped to any metric.
    async fn fetch_label_values(&self, key: &str) -> Result<Vec<String>>;
}
