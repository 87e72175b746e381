use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use flood_core::sanitize::DEFAULT_WALL;
use flood_core::{
    BoundingBox, CancelToken, ConnectedFloodEngine, EngineOptions, FloodError, FloodStats,
    GeoTiffMaskSink, GeoTiffSource, NoDataPolicy, PngPreviewSink, RasterError, RasterSink,
    RasterSource, WaterLevel,
};
use flood_storage::FloodRunStore;
use flood_storage::models::{FloodParams, FloodRunDoc};
use tracing::{info, warn};

use super::{ConnectivityArg, PropagationArg, print_summary};
use crate::scenario::Scenario;

#[derive(Args)]
pub struct RunArgs {
    /// JSON scenario file; explicit flags override its fields
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,

    /// Single-band GeoTIFF elevation raster
    #[arg(short, long)]
    pub dem: Option<PathBuf>,

    /// Subset as min_x,min_y,max_x,max_y in the raster's CRS
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: Option<BoundingBox>,

    /// Water level in the DEM datum; overrides the component flags
    #[arg(short, long, allow_hyphen_values = true)]
    pub threshold: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub tide: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub surge: Option<f64>,

    /// Sea-level rise
    #[arg(long, allow_hyphen_values = true)]
    pub slr: Option<f64>,

    /// Added to tidal-datum heights to reach the DEM datum
    #[arg(long, allow_hyphen_values = true)]
    pub datum_offset: Option<f64>,

    #[arg(long, value_enum)]
    pub connectivity: Option<ConnectivityArg>,

    #[arg(long, value_enum)]
    pub propagation: Option<PropagationArg>,

    /// NoData sentinel; defaults to the value declared in the file
    #[arg(long, allow_hyphen_values = true)]
    pub nodata: Option<f64>,

    /// Elevation substituted for NoData cells
    #[arg(long)]
    pub wall: Option<f64>,

    /// Flood mask output (8-bit GeoTIFF)
    #[arg(long)]
    pub mask_out: Option<PathBuf>,

    /// RGB preview output (PNG)
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Store the run in MongoDB under this name
    #[arg(long)]
    pub save_db: Option<String>,

    #[arg(long)]
    pub mongo_uri: Option<String>,

    /// Give up if the flood computation runs longer than this
    #[arg(long)]
    pub max_seconds: Option<u64>,
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("bad bbox number: {e}"))?;
    match parts.as_slice() {
        &[min_x, min_y, max_x, max_y] => Ok(BoundingBox::new(min_x, min_y, max_x, max_y)),
        _ => Err(format!("bbox needs 4 comma-separated numbers, got {}", parts.len())),
    }
}

// Water level from the flags, falling back to the scenario, then to zero
fn water_level(args: &RunArgs, scenario: &Scenario) -> WaterLevel {
    let base = scenario.water_level.unwrap_or_default();
    WaterLevel {
        tide: args.tide.unwrap_or(base.tide),
        surge: args.surge.unwrap_or(base.surge),
        sea_level_rise: args.slr.unwrap_or(base.sea_level_rise),
        datum_offset: args.datum_offset.unwrap_or(base.datum_offset),
    }
}

pub fn execute(args: RunArgs) -> Result<()> {
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };

    let dem = args
        .dem
        .clone()
        .or_else(|| scenario.dem.clone())
        .ok_or_else(|| anyhow!("no DEM given (use --dem or a scenario file)"))?;
    let bbox = args.bbox.or(scenario.bbox);

    let level = water_level(&args, &scenario);
    let threshold = match args.threshold.or(scenario.threshold) {
        Some(t) => t,
        None => level.threshold().context("combining water level components")?,
    };
    let from_components = args.threshold.or(scenario.threshold).is_none();
    info!(threshold, ?level, from_components, "water level resolved");

    let source =
        GeoTiffSource::open(&dem).with_context(|| format!("opening DEM {}", dem.display()))?;
    let raster = match source.read_window(bbox.as_ref()) {
        Err(RasterError::EmptyWindow(b)) => bail!("bounding box {b:?} lies outside {}", dem.display()),
        other => other?,
    };

    let defaults = NoDataPolicy::default();
    let policy = NoDataPolicy {
        nodata: args.nodata.or(scenario.nodata).or(raster.nodata),
        valid_range: scenario.valid_range.unwrap_or(defaults.valid_range),
        wall: args.wall.or(scenario.wall).unwrap_or(DEFAULT_WALL),
    };
    let grid = policy.sanitize(&raster.values)?;

    let options = EngineOptions {
        connectivity: args
            .connectivity
            .map(Into::into)
            .or(scenario.connectivity)
            .unwrap_or_default(),
        propagation: args
            .propagation
            .map(Into::into)
            .or(scenario.propagation)
            .unwrap_or_default(),
        keep_surface: false,
    };
    let token = CancelToken::new();
    if let Some(secs) = args.max_seconds {
        let watchdog = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            watchdog.cancel();
        });
    }
    let engine = ConnectedFloodEngine::new(options).with_cancel(token);

    let start = Instant::now();
    let mask = match engine.flood_mask(&grid, threshold) {
        Ok(mask) => mask,
        Err(FloodError::EmptyGrid { width, height }) => {
            bail!("no valid elevation data in bounding box ({width}x{height} cells)")
        }
        Err(FloodError::Cancelled) => bail!("flood computation exceeded --max-seconds"),
        Err(e) => return Err(e).context(format!("flooding {}", dem.display())),
    };
    info!(
        elapsed_ms = start.elapsed().as_secs_f32() * 1000.0,
        "flood computed"
    );

    let cell_size = raster.cell_size();
    let stats = FloodStats::compute(&grid, &mask, threshold, Some(cell_size))?;
    print_summary(threshold, &stats);

    if let Some(path) = args.mask_out.or(scenario.mask_out) {
        GeoTiffMaskSink::new(&path)
            .write(&mask, &grid, threshold, Some(&raster.transform))
            .with_context(|| format!("writing mask {}", path.display()))?;
    }
    if let Some(path) = args.preview.or(scenario.preview) {
        PngPreviewSink::new(&path)
            .write(&mask, &grid, threshold, Some(&raster.transform))
            .with_context(|| format!("writing preview {}", path.display()))?;
    }

    if let Some(name) = args.save_db.or(scenario.save_db) {
        let uri = args
            .mongo_uri
            .or(scenario.mongo_uri)
            .unwrap_or_else(|| "mongodb://localhost:27017".to_string());
        let params = FloodParams {
            threshold,
            water_level: from_components.then_some(level),
            connectivity: format!("{:?}", options.connectivity).to_lowercase(),
        };
        let doc = FloodRunDoc::from_outcome(name, params, &mask, &stats, Some(raster.transform))?;

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(async {
            let store = FloodRunStore::init(&uri, "flood_db", "flood_runs").await?;
            store.create(doc).await
        })
        .with_context(|| format!("saving run to {uri}"))?;
    } else if args.mongo_uri.is_some() {
        warn!("--mongo-uri given without --save-db, nothing stored");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_parsing() {
        assert_eq!(
            parse_bbox("10, -5,0,3.5").unwrap(),
            BoundingBox::new(0.0, -5.0, 10.0, 3.5)
        );
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("a,2,3,4").is_err());
    }
}
