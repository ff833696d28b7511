//! Prometheus HTTP API fetcher.
//!
//! Speaks the v1 query API: metric names come from
//! `/api/v1/label/__name__/values`, per-metric labels from `/api/v1/series`
//! (flattened into keys and values here), and unscoped label values from
//! `/api/v1/label/{key}/values`. Response envelopes are unwrapped in this
//! module; the rest of the crate only sees ordered lists.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::instrument;

use crate::{MuninnError, Result, telemetry};

use super::{MetadataFetcher, MetricLabels};

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches metric metadata from a Prometheus server.
///
/// # Example
///
/// ```ignore
/// use muninn::PrometheusFetcher;
///
/// let fetcher = PrometheusFetcher::new("http://localhost:9090");
/// ```
pub struct PrometheusFetcher {
    base_url: String,
    timeout_secs: u64,
    http_client: reqwest::Client,
}

impl PrometheusFetcher {
    /// Create a fetcher for the Prometheus server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Create a fetcher with a shared HTTP client.
    ///
    /// Prefer this over [`new`](Self::new) when the hosting application
    /// already maintains a connection pool.
    pub fn with_http_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            http_client,
        }
    }

    /// Set the per-request timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    async fn get_data<T>(&self, url: String, query: &[(&str, &str)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| MuninnError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MuninnError::Api {
                status: response.status().as_u16(),
                message: response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".into()),
            });
        }

        response
            .json()
            .await
            .map_err(|e| MuninnError::Http(e.to_string()))
    }

    /// Record fetch outcome metrics (counter + histogram).
    fn record_fetch(operation: &'static str, start: Instant, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        metrics::counter!(telemetry::FETCH_TOTAL,
            "operation" => operation,
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::FETCH_DURATION_SECONDS,
            "operation" => operation,
        )
        .record(start.elapsed().as_secs_f64());
    }
}

#[async_trait]
impl MetadataFetcher for PrometheusFetcher {
    #[instrument(name = "fetch.metric_names", skip(self))]
    async fn fetch_metric_names(&self) -> Result<Vec<String>> {
        let start = Instant::now();
        let url = format!("{}/api/v1/label/__name__/values", self.base_url);
        let result = self.get_data::<ValuesResponse>(url, &[]).await;
        Self::record_fetch("metric_names", start, result.is_ok());
        Ok(result?.data)
    }

    #[instrument(name = "fetch.metric_labels", skip(self))]
    async fn fetch_metric_labels(&self, metric: &str) -> Result<MetricLabels> {
        let start = Instant::now();
        let url = format!("{}/api/v1/series", self.base_url);
        let result = self
            .get_data::<SeriesResponse>(url, &[("match[]", metric)])
            .await;
        Self::record_fetch("metric_labels", start, result.is_ok());
        Ok(process_series(result?.data))
    }

    #[instrument(name = "fetch.label_values", skip(self))]
    async fn fetch_label_values(&self, key: &str) -> Result<Vec<String>> {
        let start = Instant::now();
        let url = format!("{}/api/v1/label/{key}/values", self.base_url);
        let result = self.get_data::<ValuesResponse>(url, &[]).await;
        Self::record_fetch("label_values", start, result.is_ok());
        Ok(result?.data)
    }
}

/// Flatten series label sets into the key list and per-key value lists the
/// cache installs. The synthetic `__name__` label is skipped; keys and
/// values keep first-seen order, values deduplicated across series.
pub(crate) fn process_series(series: Vec<IndexMap<String, String>>) -> MetricLabels {
    let mut labels = MetricLabels::default();
    for set in series {
        for (key, value) in set {
            if key == "__name__" {
                continue;
            }
            if !labels.keys.contains(&key) {
                labels.keys.push(key.clone());
            }
            let values = labels.values_by_key.entry(key).or_default();
            if !values.contains(&value) {
                values.push(value);
            }
        }
    }
    labels
}

/// Prometheus `/api/v1/label/{name}/values` response.
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    data: Vec<String>,
}

/// Prometheus `/api/v1/series` response.
#[derive(Debug, Deserialize)]
struct SeriesResponse {
    data: Vec<IndexMap<String, String>>,
}
