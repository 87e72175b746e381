use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::grid::{ElevationGrid, FloodMask, Grid};
use crate::reconstruct::{
    Connectivity, Propagation, ReconstructOptions, ReconstructionReport, reconstruct_by_erosion,
};
use crate::seed::seed_surface;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub connectivity: Connectivity,
    pub propagation: Propagation,
    // return the reconstructed surface alongside the mask
    pub keep_surface: bool,
}

/// Result of one flood run.
#[derive(Debug, Clone, PartialEq)]
pub struct FloodOutcome {
    pub mask: FloodMask,
    // reconstructed surface, only with `EngineOptions::keep_surface`
    pub surface: Option<Grid<f64>>,
    pub report: ReconstructionReport,
}

/// Marks the cells of an elevation grid that open water reaches from the grid
/// border at a given water level.
///
/// The engine keeps no state between runs, so one instance may be shared and
/// called for several thresholds against the same grid.
#[derive(Debug, Clone, Default)]
pub struct ConnectedFloodEngine {
    options: EngineOptions,
    cancel: Option<CancelToken>,
}

impl ConnectedFloodEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            cancel: None,
        }
    }

    // Poll `token` during reconstruction and abort once it is set
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn run(&self, grid: &ElevationGrid, threshold: f64) -> Result<FloodOutcome> {
        debug!(
            width = grid.width(),
            height = grid.height(),
            threshold,
            "building flood seed"
        );
        let mut surface = seed_surface(grid, threshold)?;

        let report = reconstruct_by_erosion(
            &mut surface,
            grid.grid(),
            ReconstructOptions {
                connectivity: self.options.connectivity,
                propagation: self.options.propagation,
            },
            self.cancel.as_ref(),
        )?;

        let surface = Grid::from_flat(grid.width(), grid.height(), surface)?;
        let mask = surface.map(|&r| r < threshold);
        info!(
            threshold,
            flooded = mask.as_slice().iter().filter(|&&f| f).count(),
            cells = mask.len(),
            "flood mask computed"
        );

        Ok(FloodOutcome {
            mask,
            surface: self.options.keep_surface.then_some(surface),
            report,
        })
    }

    pub fn flood_mask(&self, grid: &ElevationGrid, threshold: f64) -> Result<FloodMask> {
        self.run(grid, threshold).map(|outcome| outcome.mask)
    }
}

/// Plain `elevation < threshold` test with no connectivity rule.
pub fn naive_mask(grid: &ElevationGrid, threshold: f64) -> FloodMask {
    grid.grid().map(|&e| e < threshold)
}
