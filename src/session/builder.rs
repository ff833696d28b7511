//! Builder for configuring typeahead sessions

use std::sync::Arc;

use tracing::debug;

use crate::fetch::{MetadataFetcher, PrometheusFetcher};
use crate::{MuninnError, Result};

use super::{ErrorCallback, MetricNamesCallback, TypeaheadSession};

/// Main entry point for creating typeahead sessions.
pub struct Muninn;

impl Muninn {
    /// Create a new builder for configuring a session.
    pub fn builder() -> MuninnBuilder {
        MuninnBuilder::new()
    }
}

/// Builder for configuring typeahead sessions.
pub struct MuninnBuilder {
    prometheus_url: Option<String>,
    fetcher: Option<Arc<dyn MetadataFetcher>>,
    timeout_secs: Option<u64>,
    seed_metric_names: Option<Vec<String>>,
    on_error: Option<ErrorCallback>,
    on_metric_names: Option<MetricNamesCallback>,
}

impl MuninnBuilder {
    pub fn new() -> Self {
        Self {
            prometheus_url: None,
            fetcher: None,
            timeout_secs: None,
            seed_metric_names: None,
            on_error: None,
            on_metric_names: None,
        }
    }

    /// Fetch metadata from the Prometheus server at `url`.
    pub fn prometheus_url(mut self, url: impl Into<String>) -> Self {
        self.prometheus_url = Some(url.into());
        self
    }

    /// Use a custom metadata fetcher instead of the built-in Prometheus
    /// one. Takes precedence over [`prometheus_url`](Self::prometheus_url).
    pub fn fetcher(mut self, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the per-request fetch timeout (seconds). Only affects the
    /// built-in Prometheus fetcher.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Seed the metric-name list before the first fetch completes.
    pub fn seed_metric_names(mut self, names: Vec<String>) -> Self {
        self.seed_metric_names = Some(names);
        self
    }

    /// Report fetch failures to `callback` instead of logging them.
    pub fn on_error(mut self, callback: impl Fn(&MuninnError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Invoke `callback` with the full ordered name list after every
    /// metric-name install, so an external highlighter can be re-taught
    /// which identifiers are metrics.
    pub fn on_metric_names(
        mut self,
        callback: impl Fn(&[String]) + Send + Sync + 'static,
    ) -> Self {
        self.on_metric_names = Some(Arc::new(callback));
        self
    }

    /// Build the session.
    pub fn build(self) -> Result<TypeaheadSession> {
        let fetcher = match (self.fetcher, self.prometheus_url) {
            (Some(fetcher), _) => {
                debug!("typeahead session created with custom fetcher");
                fetcher
            }
            (None, Some(url)) => {
                debug!(%url, "typeahead session created");
                let mut fetcher = PrometheusFetcher::new(url);
                if let Some(secs) = self.timeout_secs {
                    fetcher = fetcher.timeout_secs(secs);
                }
                Arc::new(fetcher) as Arc<dyn MetadataFetcher>
            }
            (None, None) => {
                return Err(MuninnError::Configuration(
                    "no metadata source configured; call prometheus_url() or fetcher()".into(),
                ));
            }
        };

        let session = TypeaheadSession::new(fetcher, self.on_error, self.on_metric_names);
        if let Some(names) = self.seed_metric_names {
            session.set_metric_names(names);
        }
        Ok(session)
    }
}

impl Default for MuninnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
