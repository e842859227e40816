//! Slope and aspect from a sampled elevation lattice (Horn's method).

use crate::lookup::ElevationPoint;
use crate::{DemError, Result};
use geoscope_geom::Bounds;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gradients smaller than this (meters per meter) count as flat ground.
pub const FLAT_GRADIENT: f64 = 1e-12;

/// Slope and aspect for one lattice cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// Cell extent: from the sample to its southern and eastern neighbours.
    pub bounds: Bounds,
    /// Elevation at the cell's sample, in meters.
    pub elevation: f64,
    /// Slope in degrees, `0..=90`.
    pub slope: f64,
    /// Aspect in degrees, `0..360`. `None` on flat ground.
    pub aspect: Option<f64>,
}

/// Summary statistics over an [`ElevationGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSummary {
    /// Number of cells.
    pub cells: usize,
    /// Cells with no measurable gradient.
    pub flat_cells: usize,
    /// Minimum slope in degrees.
    pub min_slope: f64,
    /// Maximum slope in degrees.
    pub max_slope: f64,
    /// Mean slope in degrees.
    pub mean_slope: f64,
}

/// Result of a slope/aspect analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationGrid {
    /// Cells with a complete 3x3 neighbourhood, north to south then west to east.
    pub cells: Vec<GridCell>,
    /// Sampling resolution the grid was built with, in meters.
    pub resolution: f64,
}

impl ElevationGrid {
    /// An empty grid.
    pub fn empty(resolution: f64) -> Self {
        Self {
            cells: Vec::new(),
            resolution,
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Slope statistics, or `None` for an empty grid.
    pub fn summary(&self) -> Option<GridSummary> {
        if self.cells.is_empty() {
            return None;
        }
        let mut min_slope = f64::INFINITY;
        let mut max_slope = f64::NEG_INFINITY;
        let mut total = 0.0;
        let mut flat_cells = 0;
        for cell in &self.cells {
            min_slope = min_slope.min(cell.slope);
            max_slope = max_slope.max(cell.slope);
            total += cell.slope;
            if cell.aspect.is_none() {
                flat_cells += 1;
            }
        }
        Some(GridSummary {
            cells: self.cells.len(),
            flat_cells,
            min_slope,
            max_slope,
            mean_slope: total / self.cells.len() as f64,
        })
    }
}

/// Slope and aspect for the centre of a 3x3 window.
///
/// The window is laid out north row first:
///
/// ```text
/// a b c
/// d e f
/// g h i
/// ```
///
/// Returns `(slope, aspect)` in degrees; aspect is `None` when both gradients
/// are below [`FLAT_GRADIENT`].
pub fn horn(window: [[f64; 3]; 3], spacing_m: f64) -> (f64, Option<f64>) {
    let [[a, b, c], [d, _, f], [g, h, i]] = window;

    let dzdx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * spacing_m);
    let dzdy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / (8.0 * spacing_m);

    let slope = (dzdx * dzdx + dzdy * dzdy).sqrt().atan().to_degrees();

    if dzdx.abs() < FLAT_GRADIENT && dzdy.abs() < FLAT_GRADIENT {
        return (slope, None);
    }

    let mut aspect = dzdy.atan2(-dzdx).to_degrees();
    if aspect < 0.0 {
        aspect += 360.0;
    }
    if aspect >= 360.0 {
        aspect -= 360.0;
    }
    // Fold -0.0 into 0.0.
    (slope, Some(aspect + 0.0))
}

/// Computes slope and aspect for every interior sample of a lattice.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlopeAspectCalculator;

impl SlopeAspectCalculator {
    /// Build the grid for `points`, sampled at `resolution_m` meters.
    ///
    /// Distinct latitudes become rows (north first) and distinct longitudes
    /// columns (west first). Only samples whose eight neighbours and own value
    /// all carry an elevation produce a cell, so lattice borders and any
    /// sample next to a gap are skipped.
    pub fn compute_grid(&self, points: &[ElevationPoint], resolution_m: f64) -> Result<ElevationGrid> {
        if !(resolution_m.is_finite() && resolution_m > 0.0) {
            return Err(DemError::InvalidInput(format!(
                "resolution must be a positive number of meters, got {}",
                resolution_m
            )));
        }

        let mut lats: Vec<f64> = points.iter().map(|p| p.location.lat).collect();
        let mut lngs: Vec<f64> = points.iter().map(|p| p.location.lng).collect();
        lats.sort_by(|a, b| b.total_cmp(a));
        lats.dedup();
        lngs.sort_by(|a, b| a.total_cmp(b));
        lngs.dedup();

        let (rows, cols) = (lats.len(), lngs.len());
        if rows < 3 || cols < 3 {
            return Ok(ElevationGrid::empty(resolution_m));
        }

        let row_of: HashMap<u64, usize> =
            lats.iter().enumerate().map(|(i, v)| (key(*v), i)).collect();
        let col_of: HashMap<u64, usize> =
            lngs.iter().enumerate().map(|(j, v)| (key(*v), j)).collect();

        let mut lattice: Vec<Option<f64>> = vec![None; rows * cols];
        for p in points {
            let (Some(&r), Some(&c)) = (row_of.get(&key(p.location.lat)), col_of.get(&key(p.location.lng)))
            else {
                continue;
            };
            lattice[r * cols + c] = p.elevation.filter(|e| e.is_finite());
        }
        let at = |r: usize, c: usize| lattice[r * cols + c];

        let mut cells = Vec::new();
        for r in 1..rows - 1 {
            'cell: for c in 1..cols - 1 {
                let mut window = [[0.0; 3]; 3];
                for (dr, row) in window.iter_mut().enumerate() {
                    for (dc, value) in row.iter_mut().enumerate() {
                        match at(r + dr - 1, c + dc - 1) {
                            Some(z) => *value = z,
                            None => continue 'cell,
                        }
                    }
                }

                let (slope, aspect) = horn(window, resolution_m);
                cells.push(GridCell {
                    bounds: Bounds {
                        north: lats[r],
                        south: lats[r + 1],
                        east: lngs[c + 1],
                        west: lngs[c],
                    },
                    elevation: window[1][1],
                    slope,
                    aspect,
                });
            }
        }

        Ok(ElevationGrid {
            cells,
            resolution: resolution_m,
        })
    }
}

/// Hash key for a coordinate value; `0.0` and `-0.0` share a key.
fn key(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}
