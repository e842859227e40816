//! Typed GeoJSON model for administrative-boundary datasets.
//!
//! Only polygonal geometry is accepted. Positions are checked while
//! deserializing, so a [`FeatureCollection`] that decodes successfully holds
//! finite, in-range coordinates and rings of at least three positions.

use crate::{ring_contains, Bounds, GeomError, LatLng, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;
use std::path::Path;

/// A GeoJSON position, `[lng, lat]`.
pub type Position = [f64; 2];

/// Polygonal geometry.
///
/// A polygon is a list of rings; the first is the outer boundary and any
/// further rings are holes. Containment uses the even-odd rule within each
/// polygon, and a multipolygon contains a point if any member does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates", try_from = "RawGeometry")]
pub enum Geometry {
    /// A single polygon.
    Polygon(Vec<Vec<Position>>),
    /// Several polygons.
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

/// Wire shape before validation. Positions may carry an altitude.
#[derive(Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum RawGeometry {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

fn checked_position(raw: &[f64]) -> Result<Position> {
    if raw.len() < 2 {
        return Err(GeomError::InvalidGeometry(format!(
            "position needs at least 2 values, got {}",
            raw.len()
        )));
    }
    LatLng::new(raw[1], raw[0]).validate()?;
    Ok([raw[0], raw[1]])
}

fn checked_polygon(raw: Vec<Vec<Vec<f64>>>) -> Result<Vec<Vec<Position>>> {
    if raw.is_empty() {
        return Err(GeomError::InvalidGeometry("polygon has no rings".to_string()));
    }
    raw.into_iter()
        .map(|ring| {
            if ring.len() < 3 {
                return Err(GeomError::InvalidGeometry(format!(
                    "ring needs at least 3 positions, got {}",
                    ring.len()
                )));
            }
            ring.iter().map(|p| checked_position(p)).collect()
        })
        .collect()
}

impl TryFrom<RawGeometry> for Geometry {
    type Error = GeomError;

    fn try_from(raw: RawGeometry) -> Result<Self> {
        match raw {
            RawGeometry::Polygon(rings) => Ok(Geometry::Polygon(checked_polygon(rings)?)),
            RawGeometry::MultiPolygon(polygons) => {
                if polygons.is_empty() {
                    return Err(GeomError::InvalidGeometry("multipolygon has no polygons".to_string()));
                }
                let polygons = polygons
                    .into_iter()
                    .map(checked_polygon)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Geometry::MultiPolygon(polygons))
            }
        }
    }
}

impl Geometry {
    /// Member polygons, each as a list of rings.
    pub fn polygons(&self) -> Vec<&[Vec<Position>]> {
        match self {
            Geometry::Polygon(rings) => vec![rings.as_slice()],
            Geometry::MultiPolygon(polygons) => polygons.iter().map(Vec::as_slice).collect(),
        }
    }

    /// Every ring of every polygon.
    pub fn rings(&self) -> impl Iterator<Item = &[Position]> + '_ {
        let polygons: Box<dyn Iterator<Item = &Vec<Vec<Position>>> + '_> = match self {
            Geometry::Polygon(rings) => Box::new(std::iter::once(rings)),
            Geometry::MultiPolygon(polygons) => Box::new(polygons.iter()),
        };
        polygons.flat_map(|rings| rings.iter().map(Vec::as_slice))
    }

    /// Bounding box over all rings.
    pub fn bounds(&self) -> Bounds {
        let mut bounds: Option<Bounds> = None;
        for ring in self.rings() {
            for p in ring {
                let point = LatLng::new(p[1], p[0]);
                match bounds.as_mut() {
                    Some(b) => b.extend(point),
                    None => bounds = Bounds::enclosing([point]),
                }
            }
        }
        // Validation guarantees at least one position.
        bounds.unwrap_or(Bounds {
            north: 0.0,
            south: 0.0,
            east: 0.0,
            west: 0.0,
        })
    }

    /// Exact point-in-geometry test with even-odd holes.
    pub fn contains(&self, point: LatLng) -> bool {
        self.polygons().into_iter().any(|rings| {
            rings
                .iter()
                .filter(|ring| ring_contains(ring.as_slice(), point))
                .count()
                % 2
                == 1
        })
    }
}

/// GeoJSON allows `"properties": null`.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Feature properties. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    /// Display name of the authority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// External reference code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Entity type or owning body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Any other properties, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The identifying subset of [`Properties`] returned by containment queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    /// Display name.
    pub name: Option<String>,
    /// External reference code.
    pub reference: Option<String>,
    /// Entity type or owning body.
    pub entity: Option<String>,
}

impl From<&Properties> for Authority {
    fn from(p: &Properties) -> Self {
        Self {
            name: p.name.clone(),
            reference: p.reference.clone(),
            entity: p.entity.clone(),
        }
    }
}

/// The `"type": "Feature"` tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// The only accepted value.
    #[default]
    Feature,
}

/// The `"type": "FeatureCollection"` tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionKind {
    /// The only accepted value.
    #[default]
    FeatureCollection,
}

/// A boundary feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Always `Feature`.
    #[serde(rename = "type", default)]
    pub kind: FeatureKind,
    /// Descriptive properties.
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Properties,
    /// Polygonal geometry.
    pub geometry: Geometry,
}

impl Feature {
    /// Create a feature with the given properties and geometry.
    pub fn new(properties: Properties, geometry: Geometry) -> Self {
        Self {
            kind: FeatureKind::Feature,
            properties,
            geometry,
        }
    }

    /// Bounding box of the geometry.
    pub fn bounds(&self) -> Bounds {
        self.geometry.bounds()
    }

    /// Exact containment test against the geometry.
    pub fn contains(&self, point: LatLng) -> bool {
        self.geometry.contains(point)
    }

    /// Identifying properties.
    pub fn authority(&self) -> Authority {
        Authority::from(&self.properties)
    }
}

/// A named collection of boundary features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always `FeatureCollection`.
    #[serde(rename = "type", default)]
    pub kind: CollectionKind,
    /// Dataset name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Member features, in dataset order.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create a collection.
    pub fn new(name: Option<String>, features: Vec<Feature>) -> Self {
        Self {
            kind: CollectionKind::FeatureCollection,
            name,
            features,
        }
    }

    /// Decode and validate GeoJSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode and validate GeoJSON from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Decode and validate a GeoJSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Bounding box over every feature, if any.
    pub fn bounds(&self) -> Option<Bounds> {
        self.features
            .iter()
            .map(Feature::bounds)
            .reduce(|a, b| a.union(&b))
    }
}
