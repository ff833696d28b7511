//! Telemetry metric name constants.
//!
//! Centralised metric names for muninn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `context` — resolved cursor context (e.g. "labels", "metrics", "none")
//! - `operation` — fetch operation ("metric_names" | "metric_labels" | "label_values")
//! - `kind` — refresh kind ("metric_names" | "metric_labels" | "unanchored_label_values")
//! - `status` — outcome: "ok" or "error"

/// Total typeahead requests classified.
///
/// Labels: `context`.
pub const TYPEAHEAD_TOTAL: &str = "muninn_typeahead_total";

/// Total refreshers settled.
///
/// Labels: `kind`, `status` ("ok" | "error").
pub const REFRESH_TOTAL: &str = "muninn_refresh_total";

/// Total metadata fetch calls issued.
///
/// Labels: `operation`, `status` ("ok" | "error").
pub const FETCH_TOTAL: &str = "muninn_fetch_total";

/// Metadata fetch duration in seconds.
///
/// Labels: `operation`.
pub const FETCH_DURATION_SECONDS: &str = "muninn_fetch_duration_seconds";
