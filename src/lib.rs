//! Muninn - Context-sensitive typeahead for Prometheus-style queries
//!
//! This crate classifies the cursor position inside a partially typed
//! metrics query and produces grouped completion suggestions (metric
//! names, label keys, label values, range durations) backed by a local
//! metadata cache. Classification is synchronous; when the cache lacks
//! the metadata a context needs, the result carries a [`Refresher`]
//! future the host awaits before asking again.
//!
//! # Example
//!
//! ```rust,no_run
//! use muninn::Muninn;
//!
//! #[tokio::main]
//! async fn main() -> muninn::Result<()> {
//!     let session = Muninn::builder()
//!         .prometheus_url("http://127.0.0.1:9090")
//!         .on_error(|e| eprintln!("metadata fetch failed: {e}"))
//!         .build()?;
//!
//!     // Prime the metric-name cache once up front.
//!     session.refresh_metric_names().await;
//!
//!     let query = "rate(http_requests{job=";
//!     let mut result = session.typeahead(query, query.len());
//!     if let Some(refresher) = result.refresher.take() {
//!         refresher.await;
//!         result = session.typeahead(query, query.len());
//!     }
//!
//!     for group in &result.suggestions {
//!         println!("{}:", group.label);
//!         for item in &group.items {
//!             println!("  {}", item.text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod apply;
pub mod cache;
mod classify;
#[cfg(feature = "cli")]
pub mod config;
pub mod error;
pub mod fetch;
mod session;
pub mod syntax;
pub mod telemetry;
pub mod types;
mod version;

// Re-export main types at crate root
pub use apply::apply_suggestion;
pub use cache::{EMPTY_METRIC, MetadataCache};
pub use classify::{Classification, classify};
pub use error::{MuninnError, Result};
pub use fetch::{MetadataFetcher, MetricLabels, PrometheusFetcher};
pub use session::{
    ErrorCallback, MetricNamesCallback, Muninn, MuninnBuilder, Refresher, TypeaheadSession,
};
pub use syntax::{CursorScope, QueryScope, TokenClass};
pub use version::{GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, version_string};

// Re-export all types
pub use types::{CursorContext, RefreshKind, SuggestionGroup, SuggestionItem, TypeaheadResult};
