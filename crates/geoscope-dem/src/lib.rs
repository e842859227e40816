//! # geoscope-dem
//!
//! Terrain analysis over polygons: sample a regular lattice inside the
//! polygon, look up an elevation for every sample through an
//! [`ElevationLookup`], and derive slope and aspect per lattice cell with
//! Horn's 3x3 method.
//!
//! ## Overview
//!
//! - [`GridSampler`] turns a polygon and a resolution in meters into sample
//!   points, rejecting degenerate polygons and oversized lattices.
//! - [`lookup_chunked`] splits the samples into batches the lookup accepts
//!   and stitches the answers back together in order.
//! - [`SlopeAspectCalculator`] computes a [`GridCell`] for every sample with
//!   a complete neighbourhood.
//! - [`ElevationAnalyzer`] runs the three steps under a deadline.
//!
//! ## Example
//!
//! ```
//! use geoscope_dem::{ElevationAnalyzer, ElevationLookup, Result};
//! use geoscope_geom::LatLng;
//! use std::sync::Arc;
//!
//! /// Flat ground at 100 m.
//! struct Plateau;
//!
//! impl ElevationLookup for Plateau {
//!     fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>> {
//!         Ok(vec![Some(100.0); points.len()])
//!     }
//! }
//!
//! let analyzer = ElevationAnalyzer::new(Arc::new(Plateau));
//! let square = [
//!     LatLng::new(0.0, 0.0),
//!     LatLng::new(0.0, 0.001),
//!     LatLng::new(0.001, 0.001),
//!     LatLng::new(0.001, 0.0),
//! ];
//! let grid = analyzer.compute_elevation_grid(&square, 10.0)?;
//! assert!(grid.cells.iter().all(|c| c.slope == 0.0 && c.aspect.is_none()));
//! # Ok::<(), geoscope_dem::DemError>(())
//! ```

mod error;
mod lookup;
mod pipeline;
mod sampler;
mod terrain;

pub use error::DemError;
pub use lookup::{ElevationLookup, ElevationPoint, HttpElevationLookup, DEFAULT_LOOKUP_TIMEOUT};
pub use pipeline::{lookup_chunked, ElevationAnalyzer, DEFAULT_ANALYSIS_TIMEOUT};
pub use sampler::{sample, GridSampler, DEFAULT_MAX_SAMPLES};
pub use terrain::{horn, ElevationGrid, GridCell, GridSummary, SlopeAspectCalculator, FLAT_GRADIENT};

/// Result type for DEM operations.
pub type Result<T> = std::result::Result<T, DemError>;
