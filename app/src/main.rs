//! floodmap: connected "bathtub" flood maps from an elevation raster.

mod commands;
mod scenario;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Map which low-lying cells are connected to open water at a given level
#[derive(Parser)]
#[command(name = "floodmap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Connected coastal flood mapping", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flood a GeoTIFF DEM at a water level
    Run(commands::run::RunArgs),
    /// Flood a synthetic fractal coastline (no input data needed)
    Synth(commands::synth::SynthArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Synth(args) => commands::synth::execute(args),
    }
}
