//! geoscope CLI - terrain slope analysis and boundary lookup

use clap::{Parser, Subcommand};
use geoscope_engine::input::parse_polygon;
use geoscope_engine::logging::init_logging;
use geoscope_engine::{Engine, EngineConfig, EngineError};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "geoscope")]
#[command(author, version, about = "Terrain slope analysis and boundary lookup", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute slope and aspect over a polygon
    Grid {
        /// GeoJSON Polygon, or "lat,lng;lat,lng;..."
        #[arg(short, long, allow_hyphen_values = true)]
        polygon: String,
        /// Sampling resolution in meters
        #[arg(short, long, default_value = "30")]
        resolution: f64,
        /// Print slope statistics instead of every cell
        #[arg(short, long)]
        summary: bool,
    },
    /// Find the boundary containing a point
    Contains {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// List boundary features, optionally within a viewport
    Features {
        /// Viewport as "west,south,east,north"
        #[arg(long, allow_hyphen_values = true)]
        viewport: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), EngineError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| EngineError::InvalidInput(format!("cannot encode output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

fn run(command: Commands, engine: &Engine) -> Result<(), EngineError> {
    match command {
        Commands::Grid {
            polygon,
            resolution,
            summary,
        } => {
            let polygon = parse_polygon(&polygon)?;
            let start = Instant::now();
            let grid = engine.compute_elevation_grid(&polygon, resolution)?;
            info!(cells = grid.len(), elapsed_s = start.elapsed().as_secs_f64(), "grid computed");
            if summary {
                print_json(&grid.summary())
            } else {
                print_json(&grid)
            }
        }
        Commands::Contains { lat, lng } => print_json(&engine.query_containment(lat, lng)?),
        Commands::Features { viewport } => print_json(&engine.list_features(viewport.as_deref())?),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            init_logging("info", cli.verbose);
            eprintln!("error [{}]: {}", e.kind(), e);
            return ExitCode::from(2);
        }
    };

    init_logging(&config.log_level, cli.verbose);
    geoscope_metrics::describe_metrics();

    let result = Engine::from_config(&config).and_then(|engine| run(cli.command, &engine));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}
