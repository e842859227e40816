//! Metric declarations for the geoscope engine.
//!
//! Every metric the engine emits is declared once here as a [`Metric`]
//! constant, so names and units cannot drift between call sites. The crate
//! re-exports [`metrics`]; emitting is done with the usual macros:
//!
//! ```rust
//! use geoscope_metrics::{metric_defs, metrics};
//!
//! metrics::counter!(metric_defs::CACHE_REFRESHES.name).increment(1);
//! ```
//!
//! Without an installed recorder the macros are no-ops, which is how the
//! library crates and their tests run.

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use geoscope_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const FETCHES: Metric = Metric::counter("geoscope.example.fetches")
///     .with_description("Example fetch counter")
///     .with_unit(Unit::Count)
///     .with_labels(&["outcome"]);
///
/// assert_eq!(FETCHES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "geoscope.cache.refreshes").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// Unit of measurement, if any.
    pub unit: Option<Unit>,
    /// Expected label keys.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Declare a counter.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Declare a gauge.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Declare a histogram.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(self.name, unit, self.description),
            (MetricKind::Counter, None) => describe_counter!(self.name, self.description),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(self.name, unit, self.description),
            (MetricKind::Gauge, None) => describe_gauge!(self.name, self.description),
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description)
            }
            (MetricKind::Histogram, None) => describe_histogram!(self.name, self.description),
        }
    }
}

/// All metric definitions emitted by the engine.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Dataset cache
    // ========================================================================

    /// Successful dataset refreshes (data and index swapped in).
    pub const CACHE_REFRESHES: Metric = Metric::counter("geoscope.cache.refreshes")
        .with_description("Successful dataset refreshes")
        .with_unit(Unit::Count);

    /// Failed dataset refreshes.
    ///
    /// Labels: reason (`timeout`, `fetch`, `invalid`)
    pub const CACHE_REFRESH_FAILURES: Metric = Metric::counter("geoscope.cache.refresh_failures")
        .with_description("Dataset refreshes that failed")
        .with_unit(Unit::Count)
        .with_labels(&["reason"]);

    /// Requests answered from a stale snapshot because the refresh failed.
    pub const CACHE_STALE_SERVED: Metric = Metric::counter("geoscope.cache.stale_served")
        .with_description("Requests served from a stale snapshot after a failed refresh")
        .with_unit(Unit::Count);

    /// Features in the live snapshot.
    pub const CACHE_FEATURES: Metric = Metric::gauge("geoscope.cache.features")
        .with_description("Number of features in the live dataset snapshot")
        .with_unit(Unit::Count);

    // ========================================================================
    // Elevation lookup
    // ========================================================================

    /// Points sent to the elevation collaborator.
    pub const LOOKUP_POINTS: Metric = Metric::counter("geoscope.lookup.points")
        .with_description("Sample points sent to the elevation lookup")
        .with_unit(Unit::Count);

    /// Batches sent to the elevation collaborator.
    pub const LOOKUP_CHUNKS: Metric = Metric::counter("geoscope.lookup.chunks")
        .with_description("Batches sent to the elevation lookup")
        .with_unit(Unit::Count);

    /// Wall-clock duration of a complete (possibly chunked) lookup.
    pub const LOOKUP_DURATION: Metric = Metric::histogram("geoscope.lookup.duration_seconds")
        .with_description("Duration of a complete elevation lookup")
        .with_unit(Unit::Seconds);

    // ========================================================================
    // Queries and analysis
    // ========================================================================

    /// Containment queries answered.
    ///
    /// Labels: found (`true`, `false`)
    pub const CONTAINMENT_QUERIES: Metric = Metric::counter("geoscope.containment.queries")
        .with_description("Point containment queries answered")
        .with_unit(Unit::Count)
        .with_labels(&["found"]);

    /// Cells produced per elevation grid.
    pub const GRID_CELLS: Metric = Metric::histogram("geoscope.grid.cells")
        .with_description("Slope/aspect cells produced per analysis")
        .with_unit(Unit::Count);

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        &CACHE_REFRESHES,
        &CACHE_REFRESH_FAILURES,
        &CACHE_STALE_SERVED,
        &CACHE_FEATURES,
        &LOOKUP_POINTS,
        &LOOKUP_CHUNKS,
        &LOOKUP_DURATION,
        &CONTAINMENT_QUERIES,
        &GRID_CELLS,
    ];
}

/// Registers descriptions for every metric in [`metric_defs::ALL`].
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
