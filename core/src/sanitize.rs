use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FloodError, Result};
use crate::grid::{ElevationGrid, Grid};

/// Default wall elevation substituted for missing cells.
pub const DEFAULT_WALL: f64 = 9999.0;

/// A raw raster sample after classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Valid(f64),
    Missing,
}

/// How raw samples are classified and what replaces the missing ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoDataPolicy {
    // sentinel written by the data provider, if any
    pub nodata: Option<f64>,
    // inclusive range of plausible elevations
    pub valid_range: (f64, f64),
    pub wall: f64,
}

impl Default for NoDataPolicy {
    fn default() -> Self {
        Self {
            nodata: None,
            valid_range: (-1000.0, 9000.0),
            wall: DEFAULT_WALL,
        }
    }
}

impl NoDataPolicy {
    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn classify(&self, raw: f64) -> Sample {
        let (lo, hi) = self.valid_range;
        let is_sentinel = self.nodata.is_some_and(|nd| raw == nd);
        if !raw.is_finite() || is_sentinel || raw < lo || raw > hi {
            Sample::Missing
        } else {
            Sample::Valid(raw)
        }
    }

    fn validate(&self) -> Result<()> {
        let (lo, hi) = self.valid_range;
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(FloodError::InvalidPolicy(format!(
                "valid range [{lo}, {hi}] is not a finite interval"
            )));
        }
        if !(self.wall.is_finite() && self.wall > hi) {
            return Err(FloodError::InvalidPolicy(format!(
                "wall {} must be finite and above the valid range maximum {hi}",
                self.wall
            )));
        }
        Ok(())
    }

    /// Replace every missing sample with the wall and tag the grid with it.
    pub fn sanitize(&self, raw: &Grid<f64>) -> Result<ElevationGrid> {
        self.validate()?;
        let mut missing = 0usize;
        let clean = raw.map(|&v| match self.classify(v) {
            Sample::Valid(e) => e,
            Sample::Missing => {
                missing += 1;
                self.wall
            }
        });
        debug!(
            missing,
            cells = raw.len(),
            wall = self.wall,
            "nodata cells replaced by wall"
        );
        Ok(ElevationGrid::new(clean).with_wall(self.wall))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_samples_become_walls() {
        let raw = Grid::from_rows(vec![
            vec![-32768.0, 1.5, f64::NAN],
            vec![12000.0, 0.0, f64::NEG_INFINITY],
        ])
        .unwrap();
        let policy = NoDataPolicy::default().with_nodata(Some(-32768.0));
        let grid = policy.sanitize(&raw).unwrap();
        assert_eq!(
            grid.values(),
            &[9999.0, 1.5, 9999.0, 9999.0, 0.0, 9999.0]
        );
        assert_eq!(grid.wall(), 9999.0);
        assert_eq!(grid.max_valid(), Some(1.5));
    }

    #[test]
    fn classify_sentinel_and_range() {
        let policy = NoDataPolicy {
            nodata: Some(-9999.0),
            valid_range: (-10.0, 100.0),
            wall: 500.0,
        };
        assert_eq!(policy.classify(-9999.0), Sample::Missing);
        assert_eq!(policy.classify(101.0), Sample::Missing);
        assert_eq!(policy.classify(100.0), Sample::Valid(100.0));
    }

    #[test]
    fn wall_must_clear_valid_range() {
        let policy = NoDataPolicy {
            wall: 50.0,
            valid_range: (0.0, 100.0),
            nodata: None,
        };
        let raw = Grid::filled(2, 2, 1.0).unwrap();
        assert!(matches!(
            policy.sanitize(&raw),
            Err(FloodError::InvalidPolicy(_))
        ));
    }
}
