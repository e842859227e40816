//! # geoscope-index
//!
//! Boundary datasets held in memory with a bounding-box index in front of
//! them.
//!
//! - [`SpatialIndex`] prunes features by bounding box. [`LinearIndex`] scans
//!   a flat list and [`RTreeIndex`] uses an R-tree; both answer identically.
//! - [`query_containment`] resolves the feature containing a point with an
//!   exact polygon test behind the box pre-filter.
//! - [`filter_by_viewport`] keeps the features overlapping a box.
//! - [`DatasetCache`] fetches a dataset through a [`DatasetSource`], keeps
//!   it for a time-to-live, and swaps data and index together on refresh.
//!
//! ## Example
//!
//! ```
//! use geoscope_geom::{FeatureCollection, LatLng};
//! use geoscope_index::{query_containment, IndexKind};
//!
//! let collection = FeatureCollection::from_json_str(r#"{
//!     "type": "FeatureCollection",
//!     "features": [{
//!         "type": "Feature",
//!         "properties": {"name": "Unit"},
//!         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
//!     }]
//! }"#)?;
//!
//! let index = IndexKind::RTree.build(&collection.features);
//! let hit = query_containment(&collection.features, index.as_ref(), LatLng::new(0.5, 0.5));
//! assert_eq!(hit.and_then(|f| f.properties.name.as_deref()), Some("Unit"));
//! # Ok::<(), geoscope_geom::GeomError>(())
//! ```

mod cache;
mod error;
mod query;
mod source;
mod spatial;

pub use cache::{DatasetCache, Snapshot, DEFAULT_FETCH_TIMEOUT, DEFAULT_RETRY_BACKOFF, DEFAULT_TTL};
pub use error::IndexError;
pub use query::{filter_by_viewport, filter_indexed, query_containment};
pub use source::{DatasetSource, FileDatasetSource, HttpDatasetSource};
pub use spatial::{build_entries, IndexEntry, IndexKind, LinearIndex, RTreeIndex, SpatialIndex};

/// Result type for index and cache operations.
pub type Result<T> = std::result::Result<T, IndexError>;
