use thiserror::Error;

/// Errors raised by the flood engine and the grid/sanitizer helpers.
///
/// Every variant is detected before reconstruction touches the working
/// surface, except `Cancelled`, so a failed run never leaves a partial mask.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FloodError {
    /// Zero-sized or jagged grid, or a flat buffer that does not match the dimensions
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// No finite, non-wall elevation exists to derive the seed marker from
    #[error("no valid elevation data in grid ({width}x{height})")]
    EmptyGrid { width: usize, height: usize },

    /// NaN or infinite value reaching the engine
    #[error("non-finite value {value} at {location}")]
    NonFiniteValue { location: String, value: f64 },

    /// NoData policy whose wall does not dominate the valid range
    #[error("invalid nodata policy: {0}")]
    InvalidPolicy(String),

    #[error("flood computation cancelled")]
    Cancelled,
}

impl FloodError {
    pub fn non_finite_cell(row: usize, col: usize, value: f64) -> Self {
        Self::NonFiniteValue {
            location: format!("row {row}, col {col}"),
            value,
        }
    }

    pub fn non_finite_param(name: &str, value: f64) -> Self {
        Self::NonFiniteValue {
            location: name.to_string(),
            value,
        }
    }
}

pub type Result<T> = std::result::Result<T, FloodError>;
