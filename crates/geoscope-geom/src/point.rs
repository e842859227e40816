//! Geographic value types and great-circle distance.

use crate::{GeomError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mean Earth radius used by [`haversine_distance`], in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude, positive north.
    pub lat: f64,
    /// Longitude, positive east.
    pub lng: f64,
}

impl LatLng {
    /// Create a coordinate without validation.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that both components are finite and within the usual ranges.
    pub fn validate(&self) -> Result<()> {
        let ok = self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng);
        if ok {
            Ok(())
        } else {
            Err(GeomError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Calculate the distance between two points using the haversine formula.
///
/// Returns the distance in meters.
pub fn haversine_distance(from: LatLng, to: LatLng) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// An axis-aligned latitude/longitude rectangle.
///
/// Invariant: `north >= south` and `east >= west`. Boxes crossing the
/// antimeridian are not representable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Northern edge (maximum latitude).
    pub north: f64,
    /// Southern edge (minimum latitude).
    pub south: f64,
    /// Eastern edge (maximum longitude).
    pub east: f64,
    /// Western edge (minimum longitude).
    pub west: f64,
}

impl Bounds {
    /// Create bounds, rejecting inverted or non-finite edges.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self> {
        let bounds = Self {
            north,
            south,
            east,
            west,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check the ordering invariant.
    pub fn validate(&self) -> Result<()> {
        if ![self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(GeomError::InvalidBounds(format!("non-finite edge in {:?}", self)));
        }
        if self.north < self.south {
            return Err(GeomError::InvalidBounds(format!(
                "north {} is below south {}",
                self.north, self.south
            )));
        }
        if self.east < self.west {
            return Err(GeomError::InvalidBounds(format!(
                "east {} is west of west {}",
                self.east, self.west
            )));
        }
        Ok(())
    }

    /// Smallest box enclosing every point, or `None` for an empty iterator.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            north: first.lat,
            south: first.lat,
            east: first.lng,
            west: first.lng,
        };
        for p in points {
            bounds.extend(p);
        }
        Some(bounds)
    }

    /// Grow the box to include `point`.
    pub fn extend(&mut self, point: LatLng) {
        self.north = self.north.max(point.lat);
        self.south = self.south.min(point.lat);
        self.east = self.east.max(point.lng);
        self.west = self.west.min(point.lng);
    }

    /// Grow the box to include another box.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            west: self.west.min(other.west),
        }
    }

    /// Whether `point` lies inside or on the edge of the box.
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }

    /// Axis-aligned rectangle overlap. Touching edges count as overlapping.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.south > other.north
            || self.north < other.south
            || self.west > other.east
            || self.east < other.west)
    }

    /// Latitude extent in degrees.
    pub fn height_deg(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude extent in degrees.
    pub fn width_deg(&self) -> f64 {
        self.east - self.west
    }

    /// Great-circle height of the box in meters, measured along the west edge.
    pub fn height_meters(&self) -> f64 {
        haversine_distance(
            LatLng::new(self.south, self.west),
            LatLng::new(self.north, self.west),
        )
    }

    /// Great-circle width of the box in meters, measured along the middle latitude.
    pub fn width_meters(&self) -> f64 {
        let mid = (self.north + self.south) / 2.0;
        haversine_distance(LatLng::new(mid, self.west), LatLng::new(mid, self.east))
    }
}

/// Parses the GeoJSON `bbox` order: `west,south,east,north`.
impl FromStr for Bounds {
    type Err = GeomError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GeomError::InvalidBounds(format!(
                "expected 'west,south,east,north', got '{}'",
                s
            )));
        }
        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| GeomError::InvalidBounds(format!("'{}' is not a number", part)))?;
        }
        let [west, south, east, north] = values;
        Bounds::new(north, south, east, west)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine_distance() {
        // Seattle to Portland is approximately 233 km
        let dist = haversine_distance(LatLng::new(47.6062, -122.3321), LatLng::new(45.5152, -122.6784));
        assert!((dist - 233_000.0).abs() < 5_000.0);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let dist = haversine_distance(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0));
        assert_relative_eq!(dist, EARTH_RADIUS_M * 1f64.to_radians(), max_relative = 1e-9);
    }

    #[test]
    fn test_latlng_validate() {
        assert!(LatLng::new(45.0, -122.0).validate().is_ok());
        assert!(LatLng::new(91.0, 0.0).validate().is_err());
        assert!(LatLng::new(0.0, 181.0).validate().is_err());
        assert!(LatLng::new(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_bounds_rejects_inverted() {
        assert!(Bounds::new(1.0, 2.0, 1.0, 0.0).is_err());
        assert!(Bounds::new(2.0, 1.0, 0.0, 1.0).is_err());
        assert!(Bounds::new(2.0, 1.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn test_bounds_enclosing() {
        let b = Bounds::enclosing(vec![
            LatLng::new(1.0, 5.0),
            LatLng::new(-2.0, 3.0),
            LatLng::new(0.5, 7.0),
        ])
        .unwrap();
        assert_eq!(b, Bounds { north: 1.0, south: -2.0, east: 7.0, west: 3.0 });
        assert!(Bounds::enclosing(Vec::new()).is_none());
    }

    #[test]
    fn test_bounds_intersects() {
        let a = Bounds::new(1.0, 0.0, 1.0, 0.0).unwrap();
        let touching = Bounds::new(2.0, 1.0, 2.0, 1.0).unwrap();
        let apart = Bounds::new(11.0, 10.0, 11.0, 10.0).unwrap();
        assert!(a.intersects(&touching));
        assert!(touching.intersects(&a));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn test_bounds_contains_edges() {
        let b = Bounds::new(1.0, 0.0, 1.0, 0.0).unwrap();
        assert!(b.contains(LatLng::new(0.0, 0.0)));
        assert!(b.contains(LatLng::new(1.0, 1.0)));
        assert!(!b.contains(LatLng::new(1.0001, 0.5)));
    }

    #[test]
    fn test_bounds_from_str() {
        let b: Bounds = "0, 0, 2, 2".parse().unwrap();
        assert_eq!(b, Bounds { north: 2.0, south: 0.0, east: 2.0, west: 0.0 });

        assert!("0,0,2".parse::<Bounds>().is_err());
        assert!("a,0,2,2".parse::<Bounds>().is_err());
        assert!("0,3,2,2".parse::<Bounds>().is_err());
    }

    #[test]
    fn test_bounds_metric_extent() {
        let b = Bounds::new(1.0, 0.0, 1.0, 0.0).unwrap();
        assert_relative_eq!(b.height_meters(), 111_194.93, max_relative = 1e-4);
        assert!(b.width_meters() < b.height_meters());
    }
}
