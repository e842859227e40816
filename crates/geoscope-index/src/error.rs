//! Error types for the index crate.

use geoscope_geom::GeomError;
use std::time::Duration;
use thiserror::Error;

/// Errors from dataset sources and the dataset cache.
#[derive(Debug, Error)]
pub enum IndexError {
    /// No snapshot is cached and a fresh one could not be obtained.
    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(String),

    /// The source answered with a failure status or could not be reached.
    #[error("Dataset fetch failed: {0}")]
    FetchFailed(String),

    /// The payload was fetched but is not a valid feature collection.
    #[error("Invalid dataset: {0}")]
    InvalidDataset(#[from] GeomError),

    /// No snapshot is cached and the refresh is still running at its deadline.
    #[error("Dataset fetch timed out after {0:?}")]
    Timeout(Duration),
}
