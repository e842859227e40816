//! The engine facade: the three externally visible operations.

use crate::config::{DatasetSourceConfig, EngineConfig};
use crate::{EngineError, Result};
use geoscope_dem::{ElevationAnalyzer, ElevationGrid, GridSampler, HttpElevationLookup};
use geoscope_geom::{Authority, Bounds, FeatureCollection, LatLng};
use geoscope_index::{DatasetCache, DatasetSource, FileDatasetSource, HttpDatasetSource, Snapshot};
use geoscope_metrics::{metric_defs, metrics};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Answer to a containment query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainmentResult {
    /// Whether any feature contains the point.
    pub found: bool,
    /// Identifying properties of the containing feature.
    pub authority: Option<Authority>,
}

/// Entry point for elevation analysis and boundary queries.
///
/// Built once per process and shared by reference; the dataset cache inside
/// is the only state that outlives a call.
#[derive(Debug, Default)]
pub struct Engine {
    analyzer: Option<ElevationAnalyzer>,
    cache: Option<Arc<DatasetCache>>,
}

impl Engine {
    /// Build the collaborators named in `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = Engine::default();

        if let Some(endpoint) = &config.elevation.endpoint {
            let lookup = HttpElevationLookup::with_timeout(endpoint.as_str(), config.elevation.timeout())
                .map_err(|e| EngineError::Config(e.to_string()))?
                .with_max_batch_size(config.elevation.max_batch_size);
            let analyzer = ElevationAnalyzer::new(Arc::new(lookup))
                .with_timeout(config.elevation.timeout())
                .with_sampler(GridSampler::new(config.elevation.max_samples));
            engine = engine.with_elevation(analyzer);
        }

        if let Some(source) = &config.dataset.source {
            let source: Arc<dyn DatasetSource> = match source {
                DatasetSourceConfig::File(path) => Arc::new(FileDatasetSource::new(path)),
                DatasetSourceConfig::Http(url) => Arc::new(
                    HttpDatasetSource::new(url.as_str(), config.dataset.fetch_timeout())
                        .map_err(|e| EngineError::Config(e.to_string()))?,
                ),
            };
            let cache = DatasetCache::new(source)
                .with_ttl(config.dataset.ttl())
                .with_fetch_timeout(config.dataset.fetch_timeout())
                .with_retry_backoff(config.dataset.retry_backoff())
                .with_index_kind(config.dataset.index);
            engine = engine.with_dataset(cache);
        }

        Ok(engine)
    }

    /// Use `analyzer` for grid computation.
    pub fn with_elevation(mut self, analyzer: ElevationAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Use `cache` for boundary queries.
    pub fn with_dataset(mut self, cache: DatasetCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// The dataset cache, if one is configured.
    pub fn dataset_cache(&self) -> Option<&Arc<DatasetCache>> {
        self.cache.as_ref()
    }

    fn analyzer(&self) -> Result<&ElevationAnalyzer> {
        self.analyzer
            .as_ref()
            .ok_or_else(|| EngineError::Config("no elevation endpoint configured".to_string()))
    }

    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let cache = self
            .cache
            .as_ref()
            .ok_or_else(|| EngineError::Config("no dataset source configured".to_string()))?;
        Ok(cache.get()?)
    }

    /// Sample `polygon` at `resolution_m` meters and compute slope and
    /// aspect per cell.
    pub fn compute_elevation_grid(&self, polygon: &[LatLng], resolution_m: f64) -> Result<ElevationGrid> {
        let analyzer = self.analyzer()?;
        Ok(analyzer.compute_elevation_grid(polygon, resolution_m)?)
    }

    /// Which boundary, if any, contains (`lat`, `lng`).
    pub fn query_containment(&self, lat: f64, lng: f64) -> Result<ContainmentResult> {
        let point = LatLng::new(lat, lng);
        point.validate()?;

        let snapshot = self.snapshot()?;
        let authority = snapshot.containing(point).map(|f| f.authority());
        let found = authority.is_some();

        metrics::counter!(
            metric_defs::CONTAINMENT_QUERIES.name,
            "found" => if found { "true" } else { "false" }
        )
        .increment(1);
        tracing::debug!(%point, found, "containment query");

        Ok(ContainmentResult { found, authority })
    }

    /// The cached collection, filtered to a `west,south,east,north` viewport
    /// when one is given.
    ///
    /// A viewport that does not parse is logged and ignored; the full
    /// collection is returned.
    pub fn list_features(&self, viewport: Option<&str>) -> Result<FeatureCollection> {
        let bounds = viewport.and_then(|text| match text.parse::<Bounds>() {
            Ok(bounds) => Some(bounds),
            Err(e) => {
                tracing::warn!(viewport = text, error = %e, "ignoring malformed viewport");
                None
            }
        });
        self.list_features_in(bounds.as_ref())
    }

    /// Typed form of [`list_features`](Self::list_features). Bounds that
    /// break the north/south or east/west ordering are ignored the same way.
    pub fn list_features_in(&self, viewport: Option<&Bounds>) -> Result<FeatureCollection> {
        let snapshot = self.snapshot()?;

        let viewport = viewport.filter(|b| match b.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed viewport");
                false
            }
        });

        let Some(viewport) = viewport else {
            return Ok(snapshot.data().clone());
        };

        let features = snapshot.in_viewport(viewport).into_iter().cloned().collect();
        Ok(FeatureCollection::new(snapshot.data().name.clone(), features))
    }
}
