//! YAML configuration.
//!
//! Every field has a default, so an empty file is a valid configuration
//! (with no collaborators configured). A typical file:
//!
//! ```yaml
//! dataset:
//!   source:
//!     file: data/boundaries.geojson
//!   ttl_secs: 86400
//!   retry_backoff_secs: 60
//!   index: rtree
//! elevation:
//!   endpoint: http://localhost:8080/v1/elevation
//!   max_batch_size: 512
//! log_level: info
//! ```

use crate::{EngineError, Result};
use geoscope_dem::{DEFAULT_ANALYSIS_TIMEOUT, DEFAULT_MAX_SAMPLES};
use geoscope_index::{IndexKind, DEFAULT_FETCH_TIMEOUT, DEFAULT_RETRY_BACKOFF, DEFAULT_TTL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the boundary dataset is fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSourceConfig {
    /// A local GeoJSON file.
    File(PathBuf),
    /// A GeoJSON document served over HTTP.
    Http(String),
}

/// Boundary dataset settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// Dataset location; containment and feature listing are unavailable without one.
    /// Written as a single-entry map such as `file: path` or `http: url`.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub source: Option<DatasetSourceConfig>,
    /// Snapshot time-to-live in seconds.
    pub ttl_secs: u64,
    /// Deadline for one fetch in seconds.
    pub fetch_timeout_secs: u64,
    /// Spatial index implementation.
    pub index: IndexKind,
    /// Seconds to keep serving a stale snapshot after a failed refresh
    /// before trying again.
    pub retry_backoff_secs: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            source: None,
            ttl_secs: DEFAULT_TTL.as_secs(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            index: IndexKind::default(),
            retry_backoff_secs: DEFAULT_RETRY_BACKOFF.as_secs(),
        }
    }
}

impl DatasetConfig {
    /// Time-to-live as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Fetch deadline as a duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Retry backoff as a duration.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

/// Elevation service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElevationConfig {
    /// Lookup service URL; grid computation is unavailable without one.
    pub endpoint: Option<String>,
    /// Points per request. Zero sends everything in one request.
    pub max_batch_size: usize,
    /// Deadline for a complete lookup in seconds.
    pub timeout_secs: u64,
    /// Largest sampling lattice accepted.
    pub max_samples: usize,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_batch_size: 512,
            timeout_secs: DEFAULT_ANALYSIS_TIMEOUT.as_secs(),
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

impl ElevationConfig {
    /// Lookup deadline as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Boundary dataset.
    pub dataset: DatasetConfig,
    /// Elevation service.
    pub elevation: ElevationConfig,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            elevation: ElevationConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: EngineConfig = if yaml.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| EngineError::Config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    /// Reject zero durations and an empty sample cap.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.dataset.ttl_secs, "dataset.ttl_secs"),
            (self.dataset.fetch_timeout_secs, "dataset.fetch_timeout_secs"),
            (self.elevation.timeout_secs, "elevation.timeout_secs"),
            (self.elevation.max_samples as u64, "elevation.max_samples"),
        ];
        for (value, name) in checks {
            if value == 0 {
                return Err(EngineError::Config(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.dataset.ttl(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.dataset.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.dataset.retry_backoff(), Duration::from_secs(60));
        assert_eq!(config.dataset.index, IndexKind::Linear);
        assert_eq!(config.elevation.max_batch_size, 512);
        assert_eq!(config.elevation.max_samples, 250_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(EngineConfig::from_yaml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_parse_full() {
        let yaml = r#"
dataset:
  source:
    http: https://example.org/boundaries.geojson
  ttl_secs: 600
  index: rtree
elevation:
  endpoint: http://localhost:8080/elevation
  max_batch_size: 100
log_level: debug
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.dataset.source,
            Some(DatasetSourceConfig::Http("https://example.org/boundaries.geojson".to_string()))
        );
        assert_eq!(config.dataset.ttl_secs, 600);
        assert_eq!(config.dataset.fetch_timeout_secs, 30);
        assert_eq!(config.dataset.index, IndexKind::RTree);
        assert_eq!(config.elevation.endpoint.as_deref(), Some("http://localhost:8080/elevation"));
        assert_eq!(config.elevation.max_batch_size, 100);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_file_source() {
        let config = EngineConfig::from_yaml_str("dataset:\n  source:\n    file: data/b.geojson\n").unwrap();
        assert_eq!(
            config.dataset.source,
            Some(DatasetSourceConfig::File(PathBuf::from("data/b.geojson")))
        );
    }

    #[test]
    fn test_source_round_trips_as_map() {
        let mut config = EngineConfig::default();
        config.dataset.source = Some(DatasetSourceConfig::File(PathBuf::from("data/b.geojson")));
        config.dataset.retry_backoff_secs = 5;

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("file: data/b.geojson"), "{}", yaml);
        assert_eq!(EngineConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_rejects_unknown_source_kind() {
        assert!(matches!(
            EngineConfig::from_yaml_str("dataset:\n  source:\n    ftp: host/b.geojson\n"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_field() {
        assert!(matches!(
            EngineConfig::from_yaml_str("dataset:\n  tll_secs: 5\n"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(matches!(
            EngineConfig::from_yaml_str("elevation:\n  timeout_secs: 0\n"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            EngineConfig::load(dir.path().join("nope.yaml")),
            Err(EngineError::Config(_))
        ));
    }
}
