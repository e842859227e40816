//! Sampling, chunked lookup and slope/aspect analysis wired together.

use crate::lookup::{ElevationLookup, ElevationPoint};
use crate::sampler::GridSampler;
use crate::terrain::{ElevationGrid, SlopeAspectCalculator};
use crate::{DemError, Result};
use geoscope_common::run_with_timeout;
use geoscope_geom::{LatLng, Polygon};
use geoscope_metrics::{metric_defs, metrics};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default deadline for a complete (possibly chunked) lookup.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Send `points` to `lookup` in batches no larger than its
/// [`max_batch_size`](ElevationLookup::max_batch_size), concatenating the
/// answers in input order.
///
/// A batch whose answer has a different length than the batch fails the
/// whole lookup. An empty input never calls `lookup`.
pub fn lookup_chunked(lookup: &dyn ElevationLookup, points: &[LatLng]) -> Result<Vec<ElevationPoint>> {
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let batch = lookup
        .max_batch_size()
        .filter(|n| *n > 0)
        .unwrap_or(points.len());

    let mut out = Vec::with_capacity(points.len());
    for (index, chunk) in points.chunks(batch).enumerate() {
        let elevations = lookup.lookup(chunk)?;
        if elevations.len() != chunk.len() {
            return Err(DemError::LookupFailed(format!(
                "batch {} returned {} elevations for {} points",
                index,
                elevations.len(),
                chunk.len()
            )));
        }
        metrics::counter!(metric_defs::LOOKUP_CHUNKS.name).increment(1);
        out.extend(
            chunk
                .iter()
                .zip(elevations)
                .map(|(&location, elevation)| ElevationPoint { location, elevation }),
        );
    }

    metrics::counter!(metric_defs::LOOKUP_POINTS.name).increment(points.len() as u64);
    Ok(out)
}

/// Computes elevation grids for polygons using a shared lookup.
///
/// ```no_run
/// use geoscope_dem::{ElevationAnalyzer, HttpElevationLookup};
/// use geoscope_geom::LatLng;
/// use std::sync::Arc;
///
/// let lookup = HttpElevationLookup::new("http://localhost:8080/elevation")?;
/// let analyzer = ElevationAnalyzer::new(Arc::new(lookup));
/// let polygon = [
///     LatLng::new(47.60, -122.34),
///     LatLng::new(47.60, -122.32),
///     LatLng::new(47.62, -122.32),
/// ];
/// let grid = analyzer.compute_elevation_grid(&polygon, 30.0)?;
/// println!("{} cells", grid.len());
/// # Ok::<(), geoscope_dem::DemError>(())
/// ```
#[derive(Clone)]
pub struct ElevationAnalyzer {
    lookup: Arc<dyn ElevationLookup>,
    sampler: GridSampler,
    calculator: SlopeAspectCalculator,
    timeout: Duration,
}

impl std::fmt::Debug for ElevationAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevationAnalyzer")
            .field("sampler", &self.sampler)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ElevationAnalyzer {
    /// Create an analyzer with the default sampler and deadline.
    pub fn new(lookup: Arc<dyn ElevationLookup>) -> Self {
        Self {
            lookup,
            sampler: GridSampler::default(),
            calculator: SlopeAspectCalculator,
            timeout: DEFAULT_ANALYSIS_TIMEOUT,
        }
    }

    /// Replace the lookup deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the sampler.
    pub fn with_sampler(mut self, sampler: GridSampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// The lookup deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sample the polygon, look up elevations and compute slope and aspect.
    pub fn compute_elevation_grid(&self, polygon: &[LatLng], resolution_m: f64) -> Result<ElevationGrid> {
        let polygon = Polygon::new(polygon.to_vec())?;
        let points = self.sampler.sample(&polygon, resolution_m)?;
        tracing::info!(samples = points.len(), resolution_m, "computing elevation grid");

        let elevations = self.lookup_elevations(points)?;
        let grid = self.calculator.compute_grid(&elevations, resolution_m)?;

        metrics::histogram!(metric_defs::GRID_CELLS.name).record(grid.len() as f64);
        tracing::info!(cells = grid.len(), "elevation grid ready");
        Ok(grid)
    }

    /// Look up elevations for `points` under the analyzer's deadline.
    pub fn lookup_elevations(&self, points: Vec<LatLng>) -> Result<Vec<ElevationPoint>> {
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let lookup = Arc::clone(&self.lookup);
        let started = Instant::now();
        let result = run_with_timeout("elevation-lookup", self.timeout, move || {
            lookup_chunked(lookup.as_ref(), &points)
        })?;
        metrics::histogram!(metric_defs::LOOKUP_DURATION.name).record(started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::warn!(error = %e, "elevation lookup failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Returns `lat + lng` for each point and records batch sizes.
    #[derive(Default)]
    struct RecordingLookup {
        batch: Option<usize>,
        calls: Mutex<Vec<usize>>,
    }

    impl ElevationLookup for RecordingLookup {
        fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>> {
            self.calls.lock().push(points.len());
            Ok(points.iter().map(|p| Some(p.lat + p.lng)).collect())
        }

        fn max_batch_size(&self) -> Option<usize> {
            self.batch
        }
    }

    struct ShortLookup;

    impl ElevationLookup for ShortLookup {
        fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>> {
            Ok(vec![Some(0.0); points.len().saturating_sub(1)])
        }
    }

    struct SlowLookup;

    impl ElevationLookup for SlowLookup {
        fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(vec![None; points.len()])
        }
    }

    fn points(n: usize) -> Vec<LatLng> {
        (0..n).map(|i| LatLng::new(i as f64 * 0.001, 0.0)).collect()
    }

    #[test]
    fn test_chunks_preserve_order() {
        let lookup = RecordingLookup {
            batch: Some(3),
            ..Default::default()
        };
        let input = points(8);
        let out = lookup_chunked(&lookup, &input).unwrap();

        assert_eq!(*lookup.calls.lock(), vec![3, 3, 2]);
        assert_eq!(out.len(), 8);
        for (p, e) in input.iter().zip(&out) {
            assert_eq!(e.location, *p);
            assert_eq!(e.elevation, Some(p.lat + p.lng));
        }
    }

    #[test]
    fn test_unlimited_batch_is_single_call() {
        let lookup = RecordingLookup::default();
        lookup_chunked(&lookup, &points(10)).unwrap();
        assert_eq!(*lookup.calls.lock(), vec![10]);
    }

    #[test]
    fn test_empty_input_skips_lookup() {
        let lookup = RecordingLookup::default();
        assert!(lookup_chunked(&lookup, &[]).unwrap().is_empty());
        assert!(lookup.calls.lock().is_empty());
    }

    #[test]
    fn test_count_mismatch_fails() {
        assert!(matches!(
            lookup_chunked(&ShortLookup, &points(4)),
            Err(DemError::LookupFailed(_))
        ));
    }

    #[test]
    fn test_lookup_timeout() {
        let analyzer = ElevationAnalyzer::new(Arc::new(SlowLookup));
        assert_eq!(analyzer.timeout(), DEFAULT_ANALYSIS_TIMEOUT);

        let analyzer = analyzer.with_timeout(Duration::from_millis(20));
        assert_eq!(analyzer.timeout(), Duration::from_millis(20));
        assert!(matches!(
            analyzer.lookup_elevations(points(3)),
            Err(DemError::Timeout(_))
        ));
    }

    #[test]
    fn test_rejects_short_polygon() {
        let analyzer = ElevationAnalyzer::new(Arc::new(RecordingLookup::default()));
        let polygon = [LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.01)];
        assert!(matches!(
            analyzer.compute_elevation_grid(&polygon, 10.0),
            Err(DemError::InvalidInput(_))
        ));
    }
}
