use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FloodError, Result};
use crate::grid::{CellSize, ElevationGrid, FloodMask};

/// Summary figures for a finished flood mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloodStats {
    pub total_cells: usize,
    pub flooded_cells: usize,
    // below the threshold but cut off from the border
    pub isolated_low_cells: usize,
    // None without usable cell-size metadata
    pub flooded_area: Option<f64>,
}

impl FloodStats {
    pub fn compute(
        grid: &ElevationGrid,
        mask: &FloodMask,
        threshold: f64,
        cell_size: Option<CellSize>,
    ) -> Result<Self> {
        if (grid.width(), grid.height()) != (mask.width(), mask.height()) {
            return Err(FloodError::InvalidGrid(format!(
                "mask is {}x{} but the elevation grid is {}x{}",
                mask.width(),
                mask.height(),
                grid.width(),
                grid.height()
            )));
        }
        let flooded_cells = mask.as_slice().iter().filter(|&&f| f).count();
        let isolated_low_cells = grid
            .values()
            .iter()
            .zip(mask.as_slice())
            .filter(|&(&e, &flooded)| !flooded && e < threshold && !grid.is_wall(e))
            .count();

        let flooded_area = match cell_size.map(|c| (c, c.area())) {
            Some((_, Some(area))) => Some(flooded_cells as f64 * area),
            Some((c, None)) => {
                warn!(dx = c.dx, dy = c.dy, "unusable cell size, flooded area not reported");
                None
            }
            None => None,
        };

        Ok(Self {
            total_cells: mask.len(),
            flooded_cells,
            isolated_low_cells,
            flooded_area,
        })
    }

    pub fn flooded_fraction(&self) -> f64 {
        self.flooded_cells as f64 / self.total_cells as f64
    }
}
