use bson::oid::ObjectId;
use flood_core::{CellSize, FloodError, FloodMask, FloodStats, GeoTransform, Grid, WaterLevel};
use serde::{Deserialize, Serialize};

// What produced the threshold: explicit components or a bare value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodParams {
    pub threshold: f64,
    pub water_level: Option<WaterLevel>,
    pub connectivity: String, // "four" or "eight"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodRunDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,
    pub name: String,
    pub params: FloodParams,
    pub width: u32,
    pub height: u32,
    pub cell_size: Option<CellSize>,
    pub transform: Option<GeoTransform>,
    // Flattened row-major: 1 flooded, 0 dry, length = width×height
    pub mask: Vec<u8>,
    pub flooded_cells: u64,
    pub flooded_area: Option<f64>,
}

impl FloodRunDoc {
    pub fn from_outcome(
        name: impl Into<String>,
        params: FloodParams,
        mask: &FloodMask,
        stats: &FloodStats,
        transform: Option<GeoTransform>,
    ) -> Result<Self, FloodError> {
        let (width, height) = stored_dimensions(mask.width(), mask.height())?;
        Ok(Self {
            id: None,
            name: name.into(),
            params,
            width,
            height,
            cell_size: transform.map(|t| t.cell_size()),
            transform,
            mask: mask.as_slice().iter().map(|&f| u8::from(f)).collect(),
            flooded_cells: stats.flooded_cells as u64,
            flooded_area: stats.flooded_area,
        })
    }

    // Rebuild the stored mask; fails if the document was tampered with
    pub fn mask_grid(&self) -> Result<FloodMask, FloodError> {
        Grid::from_flat(
            self.width as usize,
            self.height as usize,
            self.mask.iter().map(|&b| b != 0).collect(),
        )
    }
}

fn stored_dimensions(width: usize, height: usize) -> Result<(u32, u32), FloodError> {
    let too_large =
        |_| FloodError::InvalidGrid(format!("{width}x{height} mask is too large to store"));
    Ok((
        u32::try_from(width).map_err(too_large)?,
        u32::try_from(height).map_err(too_large)?,
    ))
}
