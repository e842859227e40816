//! End-to-end tests of the engine operations with injected collaborators.

use geoscope_common::ManualClock;
use geoscope_dem::{DemError, ElevationAnalyzer, ElevationLookup};
use geoscope_engine::{Engine, EngineConfig, EngineError};
use geoscope_geom::{Bounds, FeatureCollection, LatLng};
use geoscope_index::{DatasetCache, DatasetSource, IndexError, IndexKind};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TWO_SQUARES: &str = r#"{
    "type": "FeatureCollection",
    "name": "districts",
    "features": [
        {"type": "Feature",
         "properties": {"name": "First District", "reference": "D-1", "entity": "council"},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[0,0],[1,0],[1,1],[0,1],[0,0]]]]}},
        {"type": "Feature",
         "properties": {"name": "Second District", "reference": "D-2", "entity": "council"},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[10,10],[11,10],[11,11],[10,11],[10,10]]]]}}
    ]
}"#;

struct StaticSource {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl StaticSource {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }
}

impl DatasetSource for StaticSource {
    fn fetch(&self) -> geoscope_index::Result<FeatureCollection> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(IndexError::FetchFailed("HTTP 503 Service Unavailable".to_string()));
        }
        Ok(FeatureCollection::from_json_str(TWO_SQUARES)?)
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// z = 0.1 * x, with x in meters east of the prime meridian.
struct TiltedPlane;

impl ElevationLookup for TiltedPlane {
    fn lookup(&self, points: &[LatLng]) -> geoscope_dem::Result<Vec<Option<f64>>> {
        let meters_per_degree = geoscope_geom::EARTH_RADIUS_M * 1f64.to_radians();
        Ok(points
            .iter()
            .map(|p| Some(0.1 * p.lng * meters_per_degree))
            .collect())
    }

    fn max_batch_size(&self) -> Option<usize> {
        Some(25)
    }
}

struct Unavailable;

impl ElevationLookup for Unavailable {
    fn lookup(&self, _points: &[LatLng]) -> geoscope_dem::Result<Vec<Option<f64>>> {
        Err(DemError::LookupFailed("service status OVER_QUERY_LIMIT".to_string()))
    }
}

fn dataset_engine(kind: IndexKind) -> (Arc<StaticSource>, Engine) {
    let source = Arc::new(StaticSource::new());
    let cache = DatasetCache::new(source.clone()).with_index_kind(kind);
    (source, Engine::default().with_dataset(cache))
}

fn names(collection: &FeatureCollection) -> Vec<&str> {
    collection
        .features
        .iter()
        .filter_map(|f| f.properties.name.as_deref())
        .collect()
}

#[test]
fn test_viewport_returns_only_overlapping_feature() {
    for kind in [IndexKind::Linear, IndexKind::RTree] {
        let (_source, engine) = dataset_engine(kind);
        let listed = engine.list_features(Some("0,0,2,2")).unwrap();
        assert_eq!(names(&listed), vec!["First District"], "{} index", kind);
        assert_eq!(listed.name.as_deref(), Some("districts"));
    }
}

#[test]
fn test_no_viewport_returns_everything() {
    let (_source, engine) = dataset_engine(IndexKind::Linear);
    let listed = engine.list_features(None).unwrap();
    assert_eq!(listed, FeatureCollection::from_json_str(TWO_SQUARES).unwrap());
}

#[test]
fn test_malformed_viewport_is_ignored() {
    let (_source, engine) = dataset_engine(IndexKind::Linear);
    for viewport in ["", "0,0,2", "west,south,east,north", "2,2,0,0"] {
        let listed = engine.list_features(Some(viewport)).unwrap();
        assert_eq!(listed.len(), 2, "viewport {:?}", viewport);
    }

    let inverted = Bounds {
        north: 0.0,
        south: 2.0,
        east: 2.0,
        west: 0.0,
    };
    assert_eq!(engine.list_features_in(Some(&inverted)).unwrap().len(), 2);
}

#[test]
fn test_containment_returns_authority() {
    let (_source, engine) = dataset_engine(IndexKind::RTree);

    let hit = engine.query_containment(10.5, 10.5).unwrap();
    assert!(hit.found);
    let authority = hit.authority.unwrap();
    assert_eq!(authority.name.as_deref(), Some("Second District"));
    assert_eq!(authority.reference.as_deref(), Some("D-2"));
    assert_eq!(authority.entity.as_deref(), Some("council"));

    let miss = engine.query_containment(5.0, 5.0).unwrap();
    assert!(!miss.found);
    assert!(miss.authority.is_none());
}

#[test]
fn test_queries_share_one_fetch() {
    let (source, engine) = dataset_engine(IndexKind::Linear);
    engine.query_containment(0.5, 0.5).unwrap();
    engine.list_features(None).unwrap();
    engine.query_containment(0.5, 0.5).unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_containment_rejects_bad_coordinates() {
    let (_source, engine) = dataset_engine(IndexKind::Linear);
    assert!(matches!(
        engine.query_containment(120.0, 0.0),
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.query_containment(f64::NAN, 0.0),
        Err(EngineError::InvalidInput(_))
    ));
}

#[test]
fn test_dataset_unavailable() {
    let (source, engine) = dataset_engine(IndexKind::Linear);
    source.failing.store(true, Ordering::SeqCst);
    assert!(matches!(
        engine.query_containment(0.5, 0.5),
        Err(EngineError::DatasetUnavailable(_))
    ));
    assert!(matches!(
        engine.list_features(None),
        Err(EngineError::DatasetUnavailable(_))
    ));
}

#[test]
fn test_stale_snapshot_served_when_refresh_fails() {
    let source = Arc::new(StaticSource::new());
    let clock = Arc::new(ManualClock::default());
    let cache = DatasetCache::new(source.clone()).with_clock(clock.clone());
    let engine = Engine::default().with_dataset(cache);

    assert!(engine.query_containment(0.5, 0.5).unwrap().found);

    clock.advance(chrono::Duration::hours(30));
    source.failing.store(true, Ordering::SeqCst);
    assert!(engine.query_containment(0.5, 0.5).unwrap().found);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_missing_collaborators() {
    let engine = Engine::default();
    assert!(engine.dataset_cache().is_none());
    assert!(matches!(engine.query_containment(0.0, 0.0), Err(EngineError::Config(_))));
    assert!(matches!(engine.list_features(None), Err(EngineError::Config(_))));
    assert!(matches!(
        engine.compute_elevation_grid(&[], 10.0),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn test_elevation_grid_over_tilted_plane() {
    let engine = Engine::default().with_elevation(ElevationAnalyzer::new(Arc::new(TiltedPlane)));
    let side = 99.9 / (geoscope_geom::EARTH_RADIUS_M * 1f64.to_radians());
    let polygon = [
        LatLng::new(0.0, 0.0),
        LatLng::new(0.0, side),
        LatLng::new(side, side),
        LatLng::new(side, 0.0),
    ];

    let grid = engine.compute_elevation_grid(&polygon, 10.0).unwrap();
    assert!(!grid.is_empty());
    for cell in &grid.cells {
        assert!((cell.slope - 5.71).abs() < 0.05, "slope {}", cell.slope);
        let aspect = cell.aspect.unwrap();
        assert!((aspect - 180.0).abs() < 1e-6, "aspect {}", aspect);
    }
}

#[test]
fn test_elevation_errors() {
    let engine = Engine::default().with_elevation(ElevationAnalyzer::new(Arc::new(TiltedPlane)));
    let triangle = [LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.01), LatLng::new(0.01, 0.0)];

    assert!(matches!(
        engine.compute_elevation_grid(&triangle[..2], 10.0),
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.compute_elevation_grid(&triangle, 0.0),
        Err(EngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.compute_elevation_grid(&triangle, -10.0),
        Err(EngineError::InvalidInput(_))
    ));

    let failing = Engine::default().with_elevation(ElevationAnalyzer::new(Arc::new(Unavailable)));
    match failing.compute_elevation_grid(&triangle, 100.0) {
        Err(EngineError::LookupFailed(reason)) => assert!(reason.contains("OVER_QUERY_LIMIT")),
        other => panic!("expected LookupFailed, got {:?}", other),
    }
}

#[test]
fn test_elevation_timeout() {
    struct Stuck;
    impl ElevationLookup for Stuck {
        fn lookup(&self, points: &[LatLng]) -> geoscope_dem::Result<Vec<Option<f64>>> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(vec![None; points.len()])
        }
    }

    let engine = Engine::default().with_elevation(
        ElevationAnalyzer::new(Arc::new(Stuck)).with_timeout(Duration::from_millis(20)),
    );
    let triangle = [LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.01), LatLng::new(0.01, 0.0)];
    assert!(matches!(
        engine.compute_elevation_grid(&triangle, 100.0),
        Err(EngineError::Timeout(_))
    ));
}

#[test]
fn test_from_config_with_file_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("districts.geojson");
    std::fs::File::create(&data_path)
        .unwrap()
        .write_all(TWO_SQUARES.as_bytes())
        .unwrap();

    let yaml = format!(
        "dataset:\n  source:\n    file: {}\n  ttl_secs: 600\n  index: rtree\n",
        data_path.display()
    );
    let config_path = dir.path().join("geoscope.yaml");
    std::fs::write(&config_path, yaml).unwrap();

    let config = EngineConfig::load(&config_path).unwrap();
    let engine = Engine::from_config(&config).unwrap();
    let cache = engine.dataset_cache().unwrap();
    assert_eq!(cache.ttl(), Duration::from_secs(600));
    assert!(cache.peek().is_none());

    let hit = engine.query_containment(0.25, 0.75).unwrap();
    assert_eq!(hit.authority.unwrap().reference.as_deref(), Some("D-1"));
    assert_eq!(engine.list_features(Some("9,9,12,12")).unwrap().len(), 1);
    assert_eq!(cache.peek().unwrap().features().len(), 2);
    assert!(matches!(
        engine.compute_elevation_grid(&[], 10.0),
        Err(EngineError::Config(_))
    ));
}
