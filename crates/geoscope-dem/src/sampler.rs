//! Regular lattice sampling over a polygon's bounding box.

use crate::{DemError, Result};
use geoscope_geom::{LatLng, Polygon};

/// Default cap on lattice size before point-in-polygon filtering.
pub const DEFAULT_MAX_SAMPLES: usize = 250_000;

/// Builds a regular lat/lng lattice across a polygon and keeps the points
/// that fall inside it.
///
/// Step counts come from the metric extent of the bounding box: height along
/// its west edge, width along its middle latitude, each divided by the
/// resolution and rounded up. The lattice spans the box exactly, so both the
/// first and last rows and columns sit on the box edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSampler {
    max_samples: usize,
}

impl Default for GridSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SAMPLES)
    }
}

impl GridSampler {
    /// Create a sampler that refuses lattices larger than `max_samples`.
    pub fn new(max_samples: usize) -> Self {
        Self { max_samples }
    }

    /// The lattice size cap.
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Sample `polygon` at roughly `resolution_m` meters between points.
    ///
    /// Points are returned row by row from south to north, west to east
    /// within a row.
    pub fn sample(&self, polygon: &Polygon, resolution_m: f64) -> Result<Vec<LatLng>> {
        if !(resolution_m.is_finite() && resolution_m > 0.0) {
            return Err(DemError::InvalidInput(format!(
                "resolution must be a positive number of meters, got {}",
                resolution_m
            )));
        }
        if polygon.is_degenerate() {
            return Err(DemError::InvalidInput(
                "polygon encloses no area".to_string(),
            ));
        }

        let bounds = polygon.bounds();
        let lat_steps = (bounds.height_meters() / resolution_m).ceil().max(1.0);
        let lng_steps = (bounds.width_meters() / resolution_m).ceil().max(1.0);

        let lattice = (lat_steps + 1.0) * (lng_steps + 1.0);
        if lattice > self.max_samples as f64 {
            return Err(DemError::InvalidInput(format!(
                "resolution {} m needs a {}x{} lattice, more than the {} sample limit",
                resolution_m,
                lat_steps + 1.0,
                lng_steps + 1.0,
                self.max_samples
            )));
        }

        let lat_steps = lat_steps as usize;
        let lng_steps = lng_steps as usize;
        let lat_step = bounds.height_deg() / lat_steps as f64;
        let lng_step = bounds.width_deg() / lng_steps as f64;

        // The last row and column are pinned to the box edges so rounding
        // never pushes them outside.
        let lat_at = |i: usize| {
            if i == lat_steps {
                bounds.north
            } else {
                bounds.south + i as f64 * lat_step
            }
        };
        let lng_at = |j: usize| {
            if j == lng_steps {
                bounds.east
            } else {
                bounds.west + j as f64 * lng_step
            }
        };

        let mut points = Vec::new();
        for i in 0..=lat_steps {
            let lat = lat_at(i);
            for j in 0..=lng_steps {
                let point = LatLng::new(lat, lng_at(j));
                if polygon.contains(point) {
                    points.push(point);
                }
            }
        }

        tracing::debug!(
            lattice_rows = lat_steps + 1,
            lattice_cols = lng_steps + 1,
            inside = points.len(),
            "sampled polygon"
        );

        Ok(points)
    }
}

/// Sample `polygon` with the default lattice cap.
pub fn sample(polygon: &Polygon, resolution_m: f64) -> Result<Vec<LatLng>> {
    GridSampler::default().sample(polygon, resolution_m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscope_geom::Bounds;

    fn square(size_deg: f64) -> Polygon {
        Polygon::new(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, size_deg),
            LatLng::new(size_deg, size_deg),
            LatLng::new(size_deg, 0.0),
        ])
        .unwrap()
    }

    fn assert_inside(polygon: &Polygon, points: &[LatLng]) {
        let bounds = polygon.bounds();
        assert!(!points.is_empty());
        for p in points {
            assert!(polygon.contains(*p), "{} is outside the polygon", p);
            assert!(bounds.contains(*p), "{} is outside the bounding box", p);
        }
    }

    #[test]
    fn test_samples_are_inside() {
        let triangle = Polygon::new(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 0.01),
            LatLng::new(0.01, 0.0),
        ])
        .unwrap();
        assert_inside(&triangle, &sample(&triangle, 100.0).unwrap());
    }

    #[test]
    fn test_concave_polygon_skips_notch() {
        // L shape: the north-east quarter of the box is cut away.
        let l_shape = Polygon::new(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 0.02),
            LatLng::new(0.01, 0.02),
            LatLng::new(0.01, 0.01),
            LatLng::new(0.02, 0.01),
            LatLng::new(0.02, 0.0),
        ])
        .unwrap();
        let points = sample(&l_shape, 100.0).unwrap();
        assert_inside(&l_shape, &points);
        assert!(!points.iter().any(|p| p.lat > 0.0105 && p.lng > 0.0105));
        // Both arms are sampled.
        assert!(points.iter().any(|p| p.lat < 0.005 && p.lng > 0.015));
        assert!(points.iter().any(|p| p.lat > 0.015 && p.lng < 0.005));
    }

    #[test]
    fn test_lattice_counts() {
        // ~1113 m square at 100 m gives 12 steps per side, 13x13 lattice.
        // North and east edge points are excluded by the containment tie-break.
        let points = sample(&square(0.01), 100.0).unwrap();
        assert_eq!(points.len(), 12 * 12);
    }

    #[test]
    fn test_rows_run_south_to_north() {
        let points = sample(&square(0.01), 500.0).unwrap();
        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert_eq!(*first, LatLng::new(0.0, 0.0));
        assert!(last.lat > first.lat);
        assert!(points.windows(2).all(|w| w[0].lat <= w[1].lat));
    }

    #[test]
    fn test_rejects_bad_resolution() {
        let poly = square(0.01);
        for r in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                sample(&poly, r),
                Err(DemError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_rejects_degenerate_polygon() {
        let line = Polygon::new(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.5, 0.5),
            LatLng::new(1.0, 1.0),
        ])
        .unwrap();
        assert!(matches!(sample(&line, 100.0), Err(DemError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_oversized_lattice() {
        let sampler = GridSampler::new(100);
        assert_eq!(sampler.max_samples(), 100);
        assert_eq!(GridSampler::default().max_samples(), DEFAULT_MAX_SAMPLES);
        assert!(matches!(
            sampler.sample(&square(0.01), 10.0),
            Err(DemError::InvalidInput(_))
        ));
        assert!(sampler.sample(&square(0.01), 500.0).is_ok());
        assert!(matches!(
            sampler.sample(&square(0.01), f64::MIN_POSITIVE),
            Err(DemError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_resolution_larger_than_polygon() {
        let poly = square(0.001);
        let bounds: Bounds = poly.bounds();
        let points = sample(&poly, 10_000.0).unwrap();
        // One step each way: only the south-west corner survives the tie-break.
        assert_eq!(points, vec![LatLng::new(bounds.south, bounds.west)]);
    }
}
