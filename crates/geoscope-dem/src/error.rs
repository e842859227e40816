//! Error types for the DEM crate.

use geoscope_common::DeadlineError;
use geoscope_geom::GeomError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while sampling, looking up, or analysing elevation.
#[derive(Debug, Error)]
pub enum DemError {
    /// Polygon, resolution or sample count rejected before any lookup.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The elevation collaborator failed or answered with the wrong shape.
    #[error("Elevation lookup failed: {0}")]
    LookupFailed(String),

    /// The lookup did not finish within its deadline.
    #[error("Elevation lookup timed out after {0:?}")]
    Timeout(Duration),
}

impl From<GeomError> for DemError {
    fn from(err: GeomError) -> Self {
        DemError::InvalidInput(err.to_string())
    }
}

impl From<DeadlineError> for DemError {
    fn from(err: DeadlineError) -> Self {
        match err {
            DeadlineError::Elapsed { timeout, .. } => DemError::Timeout(timeout),
            DeadlineError::WorkerLost(_) => DemError::LookupFailed(err.to_string()),
        }
    }
}
