//! Parsing of user-supplied polygons.

use crate::{EngineError, Result};
use geoscope_geom::{Geometry, LatLng};

/// Parse a polygon given either as a GeoJSON `Polygon` geometry (outer ring
/// used) or as `lat,lng;lat,lng;...`.
pub fn parse_polygon(text: &str) -> Result<Vec<LatLng>> {
    let text = text.trim();
    if text.starts_with('{') {
        return parse_geojson_polygon(text);
    }

    text.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(parse_vertex)
        .collect()
}

fn parse_vertex(pair: &str) -> Result<LatLng> {
    let (lat, lng) = pair
        .split_once(',')
        .ok_or_else(|| EngineError::InvalidInput(format!("vertex '{}' is not 'lat,lng'", pair)))?;
    let number = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| EngineError::InvalidInput(format!("'{}' is not a number", s.trim())))
    };
    Ok(LatLng::new(number(lat)?, number(lng)?))
}

fn parse_geojson_polygon(text: &str) -> Result<Vec<LatLng>> {
    let geometry: Geometry = serde_json::from_str(text)
        .map_err(|e| EngineError::InvalidInput(format!("invalid GeoJSON polygon: {}", e)))?;

    let polygons = geometry.polygons();
    let [rings] = polygons.as_slice() else {
        return Err(EngineError::InvalidInput(format!(
            "expected a single polygon, got {}",
            polygons.len()
        )));
    };
    let outer = rings
        .first()
        .ok_or_else(|| EngineError::InvalidInput("polygon has no rings".to_string()))?;
    Ok(outer.iter().map(|p| LatLng::new(p[1], p[0])).collect())
}
