//! Polygons given as ordered vertex lists, and the ray-casting predicate.

use crate::{Bounds, GeomError, LatLng, Result};
use serde::{Deserialize, Serialize};

/// Anything that can act as a polygon vertex.
pub trait Vertex {
    /// Latitude in degrees.
    fn lat(&self) -> f64;
    /// Longitude in degrees.
    fn lng(&self) -> f64;
}

impl Vertex for LatLng {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lng(&self) -> f64 {
        self.lng
    }
}

/// GeoJSON position order: `[lng, lat]`.
impl Vertex for [f64; 2] {
    fn lat(&self) -> f64 {
        self[1]
    }
    fn lng(&self) -> f64 {
        self[0]
    }
}

/// Ray-casting point-in-ring test.
///
/// Works for open and closed rings alike: the closing edge of an explicitly
/// closed ring has zero length and never toggles the result. Points exactly
/// on the south or west side of an edge count as inside, points on the north
/// or east side as outside, so adjacent rings never both claim a shared edge.
pub fn ring_contains<V: Vertex>(ring: &[V], point: LatLng) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let (x, y) = (point.lng, point.lat);
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].lng(), ring[i].lat());
        let (xj, yj) = (ring[j].lng(), ring[j].lat());

        // yi != yj whenever the first clause holds
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// A simple polygon given by its vertices.
///
/// The first vertex may or may not be repeated at the end; every method
/// treats the polygon as implicitly closed either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LatLng>", into = "Vec<LatLng>")]
pub struct Polygon {
    vertices: Vec<LatLng>,
}

impl Polygon {
    /// Build a polygon from at least three distinct vertices with valid coordinates.
    pub fn new(vertices: Vec<LatLng>) -> Result<Self> {
        for v in &vertices {
            v.validate()?;
        }
        let polygon = Self { vertices };
        let n = polygon.open_vertices().len();
        if n < 3 {
            return Err(GeomError::DegeneratePolygon(format!(
                "polygon needs at least 3 vertices, got {}",
                n
            )));
        }
        Ok(polygon)
    }

    /// All vertices as supplied.
    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    /// Vertices without a trailing duplicate of the first one.
    pub fn open_vertices(&self) -> &[LatLng] {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) if self.vertices.len() > 1 && first == last => {
                &self.vertices[..self.vertices.len() - 1]
            }
            _ => &self.vertices,
        }
    }

    /// Bounding box of the vertices.
    pub fn bounds(&self) -> Bounds {
        // Non-empty by construction.
        Bounds::enclosing(self.vertices.iter().copied()).unwrap_or(Bounds {
            north: 0.0,
            south: 0.0,
            east: 0.0,
            west: 0.0,
        })
    }

    /// Signed planar area in square degrees (shoelace). Positive when the
    /// vertices run counter-clockwise in lng/lat space.
    pub fn signed_area_deg2(&self) -> f64 {
        let v = self.open_vertices();
        let mut sum = 0.0;
        for i in 0..v.len() {
            let a = v[i];
            let b = v[(i + 1) % v.len()];
            sum += a.lng * b.lat - b.lng * a.lat;
        }
        sum / 2.0
    }

    /// Whether the polygon encloses no area (collinear or repeated vertices).
    pub fn is_degenerate(&self) -> bool {
        let bounds = self.bounds();
        self.signed_area_deg2() == 0.0 || bounds.height_deg() == 0.0 || bounds.width_deg() == 0.0
    }

    /// Exact point-in-polygon test.
    pub fn contains(&self, point: LatLng) -> bool {
        ring_contains(self.open_vertices(), point)
    }
}

impl TryFrom<Vec<LatLng>> for Polygon {
    type Error = GeomError;

    fn try_from(vertices: Vec<LatLng>) -> Result<Self> {
        Polygon::new(vertices)
    }
}

impl From<Polygon> for Vec<LatLng> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}
