//! Containment and viewport queries.

use crate::spatial::SpatialIndex;
use geoscope_geom::{Bounds, Feature, LatLng};

/// The first feature, in collection order, whose geometry contains `point`.
///
/// The index narrows the search to features whose bounding box holds the
/// point; each candidate is then checked with the exact even-odd test, so a
/// point inside a box but outside the polygon never matches.
pub fn query_containment<'a>(
    features: &'a [Feature],
    index: &dyn SpatialIndex,
    point: LatLng,
) -> Option<&'a Feature> {
    index
        .candidates(point)
        .into_iter()
        .filter_map(|i| features.get(i))
        .find(|f| f.contains(point))
}

/// Features whose bounding box overlaps `viewport`, in input order.
pub fn filter_by_viewport(features: &[Feature], viewport: &Bounds) -> Vec<Feature> {
    features
        .iter()
        .filter(|f| f.bounds().intersects(viewport))
        .cloned()
        .collect()
}

/// Same result as [`filter_by_viewport`], pruned through `index`.
pub fn filter_indexed<'a>(
    features: &'a [Feature],
    index: &dyn SpatialIndex,
    viewport: &Bounds,
) -> Vec<&'a Feature> {
    index
        .intersecting(viewport)
        .into_iter()
        .filter_map(|i| features.get(i))
        .collect()
}
