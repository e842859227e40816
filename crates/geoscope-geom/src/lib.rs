//! # geoscope-geom
//!
//! Geometry building blocks shared by the terrain and boundary-index crates.
//!
//! - [`LatLng`] and [`Bounds`]: geographic value types.
//! - [`Polygon`]: an ordered vertex list with bounding box, area and exact
//!   point-in-polygon predicates. Closure is never assumed.
//! - [`haversine_distance`]: great-circle distance in meters.
//! - [`FeatureCollection`], [`Feature`], [`Geometry`]: a GeoJSON-compatible
//!   model. Geometry is validated while deserializing, so malformed input is
//!   rejected at the boundary instead of surfacing later as NaNs.
//!
//! ```
//! use geoscope_geom::{LatLng, Polygon};
//!
//! let square = Polygon::new(vec![
//!     LatLng::new(0.0, 0.0),
//!     LatLng::new(0.0, 1.0),
//!     LatLng::new(1.0, 1.0),
//!     LatLng::new(1.0, 0.0),
//! ])?;
//! assert!(square.contains(LatLng::new(0.5, 0.5)));
//! assert!(!square.contains(LatLng::new(2.0, 2.0)));
//! # Ok::<(), geoscope_geom::GeomError>(())
//! ```

mod error;
mod geojson;
mod point;
mod polygon;

pub use error::GeomError;
pub use geojson::{
    Authority, CollectionKind, Feature, FeatureCollection, FeatureKind, Geometry, Position,
    Properties,
};
pub use point::{haversine_distance, Bounds, LatLng, EARTH_RADIUS_M};
pub use polygon::{ring_contains, Polygon, Vertex};

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeomError>;
