// core holds the connected-flood algorithm and the raster plumbing around it
pub mod cancel;
pub mod engine;
pub mod error;
pub mod grid;
pub mod io;
pub mod preview;
pub mod reconstruct;
pub mod sanitize;
pub mod seed;
pub mod stats;
pub mod synthetic;
pub mod water_level;

pub use cancel::CancelToken;
pub use engine::{ConnectedFloodEngine, EngineOptions, FloodOutcome, naive_mask};
pub use error::FloodError;
pub use grid::{BoundingBox, CellSize, ElevationGrid, FloodMask, GeoTransform, Grid};
pub use io::{GeoTiffMaskSink, GeoTiffSource, PngPreviewSink, RasterError};
pub use reconstruct::{Connectivity, Propagation, ReconstructOptions, reconstruct_by_erosion};
pub use sanitize::{NoDataPolicy, Sample};
pub use seed::seed_surface;
pub use stats::FloodStats;
pub use synthetic::{DiamondSquare, coastal_basin};
pub use water_level::WaterLevel;

/// Raw raster as delivered by a source, before NoData sanitizing.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRaster {
    pub values: Grid<f64>,
    pub transform: GeoTransform,
    // provider's nodata sentinel, if the file declares one
    pub nodata: Option<f64>,
}

impl LoadedRaster {
    pub fn cell_size(&self) -> CellSize {
        self.transform.cell_size()
    }
}

// Where elevation grids come from.
pub trait RasterSource {
    fn transform(&self) -> GeoTransform;

    // Whole raster for `None`, otherwise the pixels inside the box
    fn read_window(&self, bbox: Option<&BoundingBox>) -> Result<LoadedRaster, RasterError>;
}

// Where finished masks go. The elevation grid and threshold are passed along
// for sinks that render rather than just store.
pub trait RasterSink {
    fn write(
        &self,
        mask: &FloodMask,
        grid: &ElevationGrid,
        threshold: f64,
        transform: Option<&GeoTransform>,
    ) -> Result<(), RasterError>;
}
