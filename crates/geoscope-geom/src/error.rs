//! Error types for the geometry crate.

use thiserror::Error;

/// Errors raised while validating or parsing geometry.
#[derive(Debug, Error)]
pub enum GeomError {
    /// A coordinate is not finite or lies outside the valid lat/lng range.
    #[error("Invalid coordinate (lat {lat}, lng {lng})")]
    InvalidCoordinate {
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        lng: f64,
    },

    /// North below south, east below west, or a non-finite edge.
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    /// A polygon has too few vertices or no area.
    #[error("Degenerate polygon: {0}")]
    DegeneratePolygon(String),

    /// Structurally valid JSON that is not an acceptable geometry.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// JSON decoding failed.
    #[error("GeoJSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading GeoJSON.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
