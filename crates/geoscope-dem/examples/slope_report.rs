//! Example: slope report for a polygon.
//!
//! Usage: cargo run --example slope_report -- <resolution_m> <lat,lng;lat,lng;...> [endpoint]
//!
//! Without an endpoint the elevations come from a synthetic cone.

use geoscope_dem::{ElevationAnalyzer, ElevationLookup, HttpElevationLookup, Result};
use geoscope_geom::{haversine_distance, LatLng};
use std::env;
use std::sync::Arc;
use std::time::Instant;

/// A 300 m cone centred on a point, falling 0.2 m per meter.
struct Cone(LatLng);

impl ElevationLookup for Cone {
    fn lookup(&self, points: &[LatLng]) -> Result<Vec<Option<f64>>> {
        Ok(points
            .iter()
            .map(|p| Some((300.0 - 0.2 * haversine_distance(self.0, *p)).max(0.0)))
            .collect())
    }
}

fn parse_polygon(text: &str) -> Vec<LatLng> {
    text.split(';')
        .map(|pair| {
            let (lat, lng) = pair.split_once(',').expect("vertex must be 'lat,lng'");
            LatLng::new(
                lat.trim().parse().expect("Invalid latitude"),
                lng.trim().parse().expect("Invalid longitude"),
            )
        })
        .collect()
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <resolution_m> <lat,lng;lat,lng;...> [endpoint]", args[0]);
        eprintln!("Example: {} 30 '47.60,-122.34;47.60,-122.32;47.62,-122.32'", args[0]);
        std::process::exit(1);
    }

    let resolution: f64 = args[1].parse().expect("Invalid resolution");
    let polygon = parse_polygon(&args[2]);

    let lookup: Arc<dyn ElevationLookup> = match args.get(3) {
        Some(endpoint) => Arc::new(HttpElevationLookup::new(endpoint.as_str()).expect("Failed to build lookup")),
        None => {
            let n = polygon.len() as f64;
            let centre = LatLng::new(
                polygon.iter().map(|p| p.lat).sum::<f64>() / n,
                polygon.iter().map(|p| p.lng).sum::<f64>() / n,
            );
            Arc::new(Cone(centre))
        }
    };

    let start = Instant::now();
    let analyzer = ElevationAnalyzer::new(lookup);
    match analyzer.compute_elevation_grid(&polygon, resolution) {
        Ok(grid) => {
            println!("{} cells in {:.2}s", grid.len(), start.elapsed().as_secs_f64());
            if let Some(s) = grid.summary() {
                println!(
                    "slope min {:.2}° max {:.2}° mean {:.2}°, {} flat",
                    s.min_slope, s.max_slope, s.mean_slope, s.flat_cells
                );
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
