use serde::{Deserialize, Serialize};

use crate::error::{FloodError, Result};

/// Components of the still-water level, all in metres.
///
/// `tide` is referenced to the tidal datum; `datum_offset` is what must be
/// added to a tidal-datum height to express it in the elevation grid's
/// vertical datum (negative when the tidal datum sits below it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterLevel {
    pub tide: f64,
    pub surge: f64,
    pub sea_level_rise: f64,
    pub datum_offset: f64,
}

impl WaterLevel {
    /// Flood threshold in the grid's vertical datum.
    pub fn threshold(&self) -> Result<f64> {
        for (name, value) in [
            ("tide", self.tide),
            ("surge", self.surge),
            ("sea level rise", self.sea_level_rise),
            ("datum offset", self.datum_offset),
        ] {
            if !value.is_finite() {
                return Err(FloodError::non_finite_param(name, value));
            }
        }
        Ok(self.tide + self.surge + self.sea_level_rise + self.datum_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_add_up() {
        let level = WaterLevel {
            tide: 1.2,
            surge: 0.8,
            sea_level_rise: 0.5,
            datum_offset: -0.25,
        };
        assert!((level.threshold().unwrap() - 2.25).abs() < 1e-12);
    }

    #[test]
    fn nan_component_rejected() {
        let level = WaterLevel {
            surge: f64::NAN,
            ..Default::default()
        };
        match level.threshold().unwrap_err() {
            FloodError::NonFiniteValue { location, .. } => assert_eq!(location, "surge"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
