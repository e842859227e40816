//! Bounding-box indexes over a feature collection.
//!
//! An index only prunes: it answers which features *might* contain a point
//! or overlap a box. Exact decisions are made by the callers in
//! [`crate::query`].

use geoscope_geom::{Bounds, Feature, LatLng};
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounding box of one feature, keyed by its position in the collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    /// Box over every ring of every polygon of the feature.
    pub bounds: Bounds,
    /// Position of the feature in the collection the index was built from.
    pub feature: usize,
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.west, self.bounds.south],
            [self.bounds.east, self.bounds.north],
        )
    }
}

/// One entry per feature, in collection order.
pub fn build_entries(features: &[Feature]) -> Vec<IndexEntry> {
    features
        .iter()
        .enumerate()
        .map(|(feature, f)| IndexEntry {
            bounds: f.bounds(),
            feature,
        })
        .collect()
}

/// Candidate pruning over feature bounding boxes.
///
/// Results are feature positions in ascending order, so callers that walk
/// them see features in collection order whatever the implementation.
pub trait SpatialIndex: Send + Sync + fmt::Debug {
    /// Features whose box contains `point` (edges inclusive).
    fn candidates(&self, point: LatLng) -> Vec<usize>;

    /// Features whose box overlaps `viewport` (touching counts).
    fn intersecting(&self, viewport: &Bounds) -> Vec<usize>;

    /// Number of indexed features.
    fn len(&self) -> usize;

    /// Whether nothing is indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flat list of boxes, scanned on every query.
#[derive(Debug, Clone, Default)]
pub struct LinearIndex {
    entries: Vec<IndexEntry>,
}

impl LinearIndex {
    /// Index `features`.
    pub fn build(features: &[Feature]) -> Self {
        Self {
            entries: build_entries(features),
        }
    }
}

impl SpatialIndex for LinearIndex {
    fn candidates(&self, point: LatLng) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|e| e.bounds.contains(point))
            .map(|e| e.feature)
            .collect()
    }

    fn intersecting(&self, viewport: &Bounds) -> Vec<usize> {
        self.entries
            .iter()
            .filter(|e| e.bounds.intersects(viewport))
            .map(|e| e.feature)
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// R-tree over the same boxes, bulk loaded.
pub struct RTreeIndex {
    tree: RTree<IndexEntry>,
}

impl fmt::Debug for RTreeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RTreeIndex").field("len", &self.tree.size()).finish()
    }
}

impl RTreeIndex {
    /// Index `features`.
    pub fn build(features: &[Feature]) -> Self {
        Self {
            tree: RTree::bulk_load(build_entries(features)),
        }
    }

    fn collect_sorted<'a, I>(hits: I) -> Vec<usize>
    where
        I: Iterator<Item = &'a IndexEntry>,
    {
        let mut positions: Vec<usize> = hits.map(|e| e.feature).collect();
        positions.sort_unstable();
        positions
    }
}

impl SpatialIndex for RTreeIndex {
    fn candidates(&self, point: LatLng) -> Vec<usize> {
        let envelope = AABB::from_point([point.lng, point.lat]);
        Self::collect_sorted(self.tree.locate_in_envelope_intersecting(&envelope))
    }

    fn intersecting(&self, viewport: &Bounds) -> Vec<usize> {
        let envelope = AABB::from_corners(
            [viewport.west, viewport.south],
            [viewport.east, viewport.north],
        );
        Self::collect_sorted(self.tree.locate_in_envelope_intersecting(&envelope))
    }

    fn len(&self) -> usize {
        self.tree.size()
    }
}

/// Which [`SpatialIndex`] implementation to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// [`LinearIndex`].
    #[default]
    Linear,
    /// [`RTreeIndex`].
    RTree,
}

impl IndexKind {
    /// Build an index of this kind over `features`.
    pub fn build(self, features: &[Feature]) -> Box<dyn SpatialIndex> {
        match self {
            IndexKind::Linear => Box::new(LinearIndex::build(features)),
            IndexKind::RTree => Box::new(RTreeIndex::build(features)),
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Linear => write!(f, "linear"),
            IndexKind::RTree => write!(f, "rtree"),
        }
    }
}
