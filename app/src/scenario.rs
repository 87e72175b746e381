// Scenario files: JSON documents naming the same settings as the `run` flags.
// Flags given on the command line take precedence over the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flood_core::{BoundingBox, Connectivity, Propagation, WaterLevel};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub dem: Option<PathBuf>,
    pub bbox: Option<BoundingBox>,
    pub threshold: Option<f64>,
    pub water_level: Option<WaterLevel>,
    pub connectivity: Option<Connectivity>,
    pub propagation: Option<Propagation>,
    pub nodata: Option<f64>,
    pub wall: Option<f64>,
    pub valid_range: Option<(f64, f64)>,
    pub mask_out: Option<PathBuf>,
    pub preview: Option<PathBuf>,
    pub save_db: Option<String>,
    pub mongo_uri: Option<String>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_scenario_parses() {
        let s = Scenario::parse(
            r#"{
                "dem": "coast.tif",
                "water_level": { "tide": 1.1, "surge": 0.6 },
                "connectivity": "eight",
                "bbox": { "min_x": 0.0, "min_y": 0.0, "max_x": 10.0, "max_y": 5.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(s.dem, Some(PathBuf::from("coast.tif")));
        assert_eq!(s.connectivity, Some(Connectivity::Eight));
        let level = s.water_level.unwrap();
        assert_eq!(level.sea_level_rise, 0.0);
        assert!((level.threshold().unwrap() - 1.7).abs() < 1e-12);
        assert!(s.threshold.is_none());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(Scenario::parse(r#"{ "treshold": 2.0 }"#).is_err());
    }
}
