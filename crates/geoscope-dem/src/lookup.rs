//! The elevation collaborator and its HTTP implementation.

use crate::{DemError, Result};
use geoscope_geom::LatLng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout applied by [`HttpElevationLookup`] to each request.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// A sample point paired with the elevation found for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationPoint {
    /// Where the sample was taken.
    pub location: LatLng,
    /// Elevation in meters, `None` when the source has no data there.
    pub elevation: Option<f64>,
}

/// A source of elevations for batches of points.
///
/// Implementations must return exactly one entry per input point, in input
/// order. Callers verify the count and treat a mismatch as a failed lookup.
pub trait ElevationLookup: Send + Sync {
    /// Look up the elevation of every point in `points`.
    fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>>;

    /// Largest batch the source accepts in one call, if limited.
    fn max_batch_size(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    locations: &'a [LatLng],
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: String,
    #[serde(default)]
    results: Vec<LookupResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    elevation: Option<f64>,
}

/// Elevation lookup backed by a JSON HTTP service.
///
/// The service receives `{"locations": [{"lat": .., "lng": ..}, ..]}` as a
/// POST body and answers with `{"status": "OK", "results": [{"elevation": ..}]}`.
pub struct HttpElevationLookup {
    endpoint: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
    max_batch_size: Option<usize>,
}

impl std::fmt::Debug for HttpElevationLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpElevationLookup")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("max_batch_size", &self.max_batch_size)
            .finish()
    }
}

impl HttpElevationLookup {
    /// Create a lookup against `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_LOOKUP_TIMEOUT)
    }

    /// Create a lookup with a per-request timeout.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DemError::LookupFailed(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
            timeout,
            max_batch_size: None,
        })
    }

    /// Limit how many points go into one request.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = (max_batch_size > 0).then_some(max_batch_size);
        self
    }

    /// The service URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_error(&self, err: reqwest::Error) -> DemError {
        if err.is_timeout() {
            DemError::Timeout(self.timeout)
        } else {
            DemError::LookupFailed(err.to_string())
        }
    }
}

impl ElevationLookup for HttpElevationLookup {
    fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>> {
        tracing::debug!(endpoint = %self.endpoint, points = points.len(), "requesting elevations");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&LookupRequest { locations: points })
            .send()
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            return Err(DemError::LookupFailed(format!("HTTP {}", response.status())));
        }

        let body: LookupResponse = response.json().map_err(|e| self.request_error(e))?;
        parse_response(body)
    }

    fn max_batch_size(&self) -> Option<usize> {
        self.max_batch_size
    }
}

fn parse_response(body: LookupResponse) -> Result<Vec<Option<f64>>> {
    if body.status != "OK" {
        let reason = match body.error_message {
            Some(msg) => format!("service status {}: {}", body.status, msg),
            None => format!("service status {}", body.status),
        };
        return Err(DemError::LookupFailed(reason));
    }
    Ok(body
        .results
        .into_iter()
        .map(|r| r.elevation.filter(|e| e.is_finite()))
        .collect())
}
