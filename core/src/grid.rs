use serde::{Deserialize, Serialize};

use crate::error::{FloodError, Result};
use crate::sanitize::DEFAULT_WALL;

// Dense 2D raster: row-major, `cells[row * width + col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    // Build from a row-major buffer; its length must be width × height
    pub fn from_flat(width: usize, height: usize, cells: Vec<T>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FloodError::InvalidGrid(format!(
                "dimensions must be at least 1x1, got {width}x{height}"
            )));
        }
        if cells.len() != width * height {
            return Err(FloodError::InvalidGrid(format!(
                "{} cells supplied for a {width}x{height} grid",
                cells.len()
            )));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    // Build from nested rows, `rows[y][x]`; rejects jagged input
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some((y, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(FloodError::InvalidGrid(format!(
                "row {y} has {} cells, expected {width}",
                row.len()
            )));
        }
        let cells = rows.into_iter().flatten().collect();
        Self::from_flat(width, height, cells)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    // A valid grid always has at least one cell
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.width, index % self.width)
    }

    #[inline]
    pub fn is_border(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 == self.height || col + 1 == self.width
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.height && col < self.width {
            self.cells.get(self.index(row, col))
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    pub fn into_vec(self) -> Vec<T> {
        self.cells
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(f).collect(),
        }
    }

    // Indices of the outer ring, each listed once, clockwise from the origin
    pub fn border_indices(&self) -> Vec<usize> {
        let (w, h) = (self.width, self.height);
        if w == 1 || h == 1 {
            return (0..w * h).collect();
        }
        let mut ring = Vec::with_capacity(2 * (w + h) - 4);
        ring.extend((0..w).map(|x| self.index(0, x)));
        ring.extend((1..h).map(|y| self.index(y, w - 1)));
        ring.extend((0..w - 1).rev().map(|x| self.index(h - 1, x)));
        ring.extend((1..h - 1).rev().map(|y| self.index(y, 0)));
        ring
    }
}

impl<T: Clone> Grid<T> {
    pub fn filled(width: usize, height: usize, value: T) -> Result<Self> {
        Self::from_flat(width, height, vec![value; width * height])
    }

    // Back to nested rows, mirror of `from_rows`
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.cells.chunks(self.width).map(<[T]>::to_vec).collect()
    }
}

/// Boolean flood mask, `true` = flooded.
pub type FloodMask = Grid<bool>;

/// Elevation grid handed to the engine.
///
/// `wall` is the value substituted for missing cells; cells at or above it
/// are walls and are ignored when the seed marker is derived. It defaults to
/// [`DEFAULT_WALL`], so a grid pre-filled by the caller is treated the same
/// as one produced by the sanitizer.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    grid: Grid<f64>,
    wall: f64,
}

impl ElevationGrid {
    pub fn new(grid: Grid<f64>) -> Self {
        Self {
            grid,
            wall: DEFAULT_WALL,
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        Grid::from_rows(rows).map(Self::new)
    }

    pub fn from_flat(width: usize, height: usize, values: Vec<f64>) -> Result<Self> {
        Grid::from_flat(width, height, values).map(Self::new)
    }

    pub fn with_wall(mut self, wall: f64) -> Self {
        self.wall = wall;
        self
    }

    pub fn wall(&self) -> f64 {
        self.wall
    }

    #[inline]
    pub fn is_wall(&self, value: f64) -> bool {
        value >= self.wall
    }

    pub fn grid(&self) -> &Grid<f64> {
        &self.grid
    }

    pub fn values(&self) -> &[f64] {
        self.grid.as_slice()
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.grid.get(row, col).copied()
    }

    // Maximum over finite, non-wall cells; None when every cell is a wall
    pub fn max_valid(&self) -> Option<f64> {
        self.values()
            .iter()
            .copied()
            .filter(|v| v.is_finite() && !self.is_wall(*v))
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }

    // First NaN/infinite cell, as (row, col, value)
    pub fn first_non_finite(&self) -> Option<(usize, usize, f64)> {
        self.values()
            .iter()
            .position(|v| !v.is_finite())
            .map(|i| {
                let (row, col) = self.grid.coords(i);
                (row, col, self.values()[i])
            })
    }
}

/// Ground size of one cell along each axis, in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub dx: f64,
    pub dy: f64,
}

impl CellSize {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    // Area of one cell, None when either axis is unusable
    pub fn area(&self) -> Option<f64> {
        let (dx, dy) = (self.dx.abs(), self.dy.abs());
        (dx.is_finite() && dy.is_finite() && dx > 0.0 && dy > 0.0).then_some(dx * dy)
    }
}

/// Affine placement of a north-up raster: the map coordinate of the
/// top-left corner of pixel (0, 0) and the pixel size along each axis.
/// `pixel_height` is positive; rows grow southwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn cell_size(&self) -> CellSize {
        CellSize::new(self.pixel_width, self.pixel_height)
    }

    // Transform of a sub-window starting at (row, col)
    pub fn shifted(&self, row: usize, col: usize) -> Self {
        Self {
            origin_x: self.origin_x + col as f64 * self.pixel_width,
            origin_y: self.origin_y - row as f64 * self.pixel_height,
            ..*self
        }
    }
}

/// Bounding box in the raster's own coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }
}

/// Pixel window (row/col offset and extent) inside a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub row: usize,
    pub col: usize,
    pub height: usize,
    pub width: usize,
}

impl Window {
    // Pixels whose centres fall inside `bbox`, clipped to the raster extent
    pub fn from_bbox(
        transform: &GeoTransform,
        bbox: &BoundingBox,
        width: usize,
        height: usize,
    ) -> Option<Self> {
        let col_of = |x: f64| (x - transform.origin_x) / transform.pixel_width - 0.5;
        let row_of = |y: f64| (transform.origin_y - y) / transform.pixel_height - 0.5;

        let c0 = col_of(bbox.min_x).ceil().max(0.0);
        let c1 = col_of(bbox.max_x).floor().min(width as f64 - 1.0);
        let r0 = row_of(bbox.max_y).ceil().max(0.0);
        let r1 = row_of(bbox.min_y).floor().min(height as f64 - 1.0);
        if !(c0 <= c1 && r0 <= r1) {
            return None;
        }
        Some(Self {
            row: r0 as usize,
            col: c0 as usize,
            height: (r1 - r0) as usize + 1,
            width: (c1 - c0) as usize + 1,
        })
    }
}

impl<T: Clone> Grid<T> {
    // Copy out a window; caller guarantees it lies inside the grid
    pub fn subset(&self, window: &Window) -> Result<Grid<T>> {
        if window.row + window.height > self.height || window.col + window.width > self.width {
            return Err(FloodError::InvalidGrid(format!(
                "window {window:?} exceeds {}x{} grid",
                self.width, self.height
            )));
        }
        let mut cells = Vec::with_capacity(window.width * window.height);
        for y in window.row..window.row + window.height {
            let start = self.index(y, window.col);
            cells.extend_from_slice(&self.cells[start..start + window.width]);
        }
        Grid::from_flat(window.width, window.height, cells)
    }
}
