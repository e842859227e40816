//! Error types surfaced by the engine.

use geoscope_dem::DemError;
use geoscope_geom::GeomError;
use geoscope_index::IndexError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`Engine`](crate::Engine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad polygon, resolution or coordinates. Never worth retrying.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The elevation collaborator reported a failure.
    #[error("Lookup failed: {0}")]
    LookupFailed(String),

    /// A bounded wait expired.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// No cached dataset and none could be fetched.
    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(String),

    /// Configuration could not be read, or an operation needs a
    /// collaborator that was not configured.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Stable short name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::LookupFailed(_) => "lookup_failed",
            EngineError::Timeout(_) => "timeout",
            EngineError::DatasetUnavailable(_) => "dataset_unavailable",
            EngineError::Config(_) => "config",
        }
    }
}

impl From<DemError> for EngineError {
    fn from(err: DemError) -> Self {
        match err {
            DemError::InvalidInput(reason) => EngineError::InvalidInput(reason),
            DemError::LookupFailed(reason) => EngineError::LookupFailed(reason),
            DemError::Timeout(timeout) => EngineError::Timeout(timeout),
        }
    }
}

impl From<IndexError> for EngineError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Timeout(timeout) => EngineError::Timeout(timeout),
            IndexError::DatasetUnavailable(reason) => EngineError::DatasetUnavailable(reason),
            other => EngineError::DatasetUnavailable(other.to_string()),
        }
    }
}

impl From<GeomError> for EngineError {
    fn from(err: GeomError) -> Self {
        EngineError::InvalidInput(err.to_string())
    }
}
