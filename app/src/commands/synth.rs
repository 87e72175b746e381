use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use flood_core::{
    CellSize, ConnectedFloodEngine, DiamondSquare, EngineOptions, FloodStats, PngPreviewSink,
    RasterSink,
};
use tracing::info;

use super::{ConnectivityArg, PropagationArg, print_summary};

#[derive(Args)]
pub struct SynthArgs {
    /// Grid size is 2^n + 1
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u32).range(2..=12))]
    pub exp: u32,

    #[arg(long, default_value = "2025")]
    pub seed: u64,

    #[arg(long, default_value = "0.55")]
    pub roughness: f64,

    /// Lowest terrain elevation
    #[arg(long, default_value = "-4.0", allow_hyphen_values = true)]
    pub low: f64,

    /// Highest terrain elevation
    #[arg(long, default_value = "30.0")]
    pub high: f64,

    #[arg(short, long, default_value = "2.0", allow_hyphen_values = true)]
    pub threshold: f64,

    /// Ground size of one cell
    #[arg(long, default_value = "10.0")]
    pub cell: f64,

    #[arg(long, value_enum, default_value = "four")]
    pub connectivity: ConnectivityArg,

    #[arg(long, value_enum, default_value = "fifo")]
    pub propagation: PropagationArg,

    #[arg(long, default_value = "synthetic_flood.png")]
    pub preview: PathBuf,
}

pub fn execute(args: SynthArgs) -> Result<()> {
    let size = (1usize << args.exp) + 1;
    info!(size, seed = args.seed, "generating synthetic terrain");
    let grid = DiamondSquare::new(size, args.seed, args.roughness)?.generate(args.low, args.high)?;

    let engine = ConnectedFloodEngine::new(EngineOptions {
        connectivity: args.connectivity.into(),
        propagation: args.propagation.into(),
        keep_surface: false,
    });
    let mask = engine.flood_mask(&grid, args.threshold)?;
    let stats = FloodStats::compute(
        &grid,
        &mask,
        args.threshold,
        Some(CellSize::new(args.cell, args.cell)),
    )?;
    print_summary(args.threshold, &stats);

    PngPreviewSink::new(&args.preview)
        .write(&mask, &grid, args.threshold, None)
        .with_context(|| format!("writing preview {}", args.preview.display()))?;
    println!("Saved {}", args.preview.display());
    Ok(())
}
