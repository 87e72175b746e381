pub mod run;
pub mod synth;

use clap::ValueEnum;
use flood_core::{Connectivity, FloodStats, Propagation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConnectivityArg {
    Four,
    Eight,
}

impl From<ConnectivityArg> for Connectivity {
    fn from(arg: ConnectivityArg) -> Self {
        match arg {
            ConnectivityArg::Four => Connectivity::Four,
            ConnectivityArg::Eight => Connectivity::Eight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PropagationArg {
    Fifo,
    Priority,
}

impl From<PropagationArg> for Propagation {
    fn from(arg: PropagationArg) -> Self {
        match arg {
            PropagationArg::Fifo => Propagation::Fifo,
            PropagationArg::Priority => Propagation::Priority,
        }
    }
}

pub fn print_summary(threshold: f64, stats: &FloodStats) {
    println!("water level      : {threshold:.3}");
    println!(
        "flooded cells    : {} of {} ({:.2}%)",
        stats.flooded_cells,
        stats.total_cells,
        stats.flooded_fraction() * 100.0
    );
    println!("isolated low     : {}", stats.isolated_low_cells);
    match stats.flooded_area {
        Some(area) => println!("flooded area     : {area:.1} map units²"),
        None => println!("flooded area     : n/a (no usable cell size)"),
    }
}
