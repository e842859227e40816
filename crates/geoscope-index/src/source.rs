//! Where dataset payloads come from.

use crate::{IndexError, Result};
use geoscope_geom::FeatureCollection;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A provider of complete feature collections.
///
/// Called by [`DatasetCache`](crate::DatasetCache) on a worker thread, at
/// most once at a time per cache.
pub trait DatasetSource: Send + Sync {
    /// Fetch and decode the whole dataset.
    fn fetch(&self) -> Result<FeatureCollection>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// Reads GeoJSON from a local file on every fetch.
#[derive(Debug, Clone)]
pub struct FileDatasetSource {
    path: PathBuf,
}

impl FileDatasetSource {
    /// Create a source for `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DatasetSource for FileDatasetSource {
    fn fetch(&self) -> Result<FeatureCollection> {
        Ok(FeatureCollection::from_file(&self.path)?)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Downloads GeoJSON with an HTTP GET.
pub struct HttpDatasetSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for HttpDatasetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDatasetSource").field("url", &self.url).finish()
    }
}

impl HttpDatasetSource {
    /// Create a source for `url` whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexError::FetchFailed(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl DatasetSource for HttpDatasetSource {
    fn fetch(&self) -> Result<FeatureCollection> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| IndexError::FetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IndexError::FetchFailed(format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .map_err(|e| IndexError::FetchFailed(e.to_string()))?;
        Ok(FeatureCollection::from_json_str(&body)?)
    }

    fn describe(&self) -> String {
        format!("url {}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_SQUARES: &str = r#"{
        "type": "FeatureCollection",
        "name": "boundaries",
        "features": [
            {"type": "Feature", "properties": {"name": "A"},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[0,0],[1,0],[1,1],[0,1],[0,0]]]]}},
            {"type": "Feature", "properties": {"name": "B"},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[10,10],[11,10],[11,11],[10,11],[10,10]]]]}}
        ]
    }"#;

    #[test]
    fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_SQUARES.as_bytes()).unwrap();

        let source = FileDatasetSource::new(file.path());
        let collection = source.fetch().unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.name.as_deref(), Some("boundaries"));
        assert!(source.describe().starts_with("file "));
    }

    #[test]
    fn test_file_source_invalid_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]}}]}"#)
            .unwrap();

        let result = FileDatasetSource::new(file.path()).fetch();
        assert!(matches!(result, Err(IndexError::InvalidDataset(_))));
    }

    #[test]
    fn test_file_source_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileDatasetSource::new(dir.path().join("missing.geojson")).fetch();
        assert!(result.is_err());
    }
}
