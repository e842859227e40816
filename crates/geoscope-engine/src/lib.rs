//! # geoscope-engine
//!
//! The public face of geoscope. [`Engine`] wires an elevation
//! [`ElevationAnalyzer`](geoscope_dem::ElevationAnalyzer) and a boundary
//! [`DatasetCache`](geoscope_index::DatasetCache) together behind three
//! operations:
//!
//! - [`Engine::compute_elevation_grid`]: slope and aspect over a polygon
//! - [`Engine::query_containment`]: which boundary contains a point
//! - [`Engine::list_features`]: the boundary collection, optionally
//!   filtered to a viewport
//!
//! Collaborators are configured from YAML ([`EngineConfig`]) or injected
//! directly with [`Engine::with_elevation`] and [`Engine::with_dataset`].

pub mod config;
mod engine;
mod error;
pub mod input;
pub mod logging;

pub use config::{DatasetConfig, DatasetSourceConfig, ElevationConfig, EngineConfig};
pub use engine::{ContainmentResult, Engine};
pub use error::EngineError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
