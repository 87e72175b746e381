// Grayscale morphological reconstruction by erosion.
//
// The marker surface is lowered towards the floor surface by propagating
// values between neighbouring cells: a cell q next to p may drop to
// max(R[p], floor[q]) when that is lower than its current value. Repeating
// this until nothing changes yields the greatest surface that is bounded by
// the marker from above and the floor from below.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{FloodError, Result};
use crate::grid::Grid;

const FOUR: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const EIGHT: [(isize, isize); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Which cells count as neighbours during propagation.
///
/// `Four` (edge neighbours only) is the default. `Eight` also lets water pass
/// between diagonal cells, so it floods through one-cell pinch points that
/// `Four` treats as closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    #[default]
    Four,
    Eight,
}

impl Connectivity {
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &FOUR,
            Connectivity::Eight => &EIGHT,
        }
    }
}

/// Order in which the work queue is drained. Both reach the same surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Propagation {
    // FIFO region growing: border cells first, then the rest in raster order
    #[default]
    Fifo,
    // Lowest value first (priority-flood); every cell settles on its first pop
    Priority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructOptions {
    pub connectivity: Connectivity,
    pub propagation: Propagation,
}

/// Work counters of one reconstruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructionReport {
    pub pops: usize,
    pub updates: usize,
}

// f64 with a total order for the heap; NaN never reaches here
#[derive(Debug, Clone, Copy, PartialEq)]
struct Level(f64);

impl Eq for Level {}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Lower `marker` in place to its reconstruction by erosion over `floor`.
///
/// `marker` is row-major with the same shape as `floor` and should dominate it
/// (`marker >= floor` everywhere). The token, if any, is polled once per
/// queue pop; on cancellation `marker` is left half-eroded and must be dropped.
pub fn reconstruct_by_erosion(
    marker: &mut [f64],
    floor: &Grid<f64>,
    options: ReconstructOptions,
    cancel: Option<&CancelToken>,
) -> Result<ReconstructionReport> {
    if marker.len() != floor.len() {
        return Err(FloodError::InvalidGrid(format!(
            "marker has {} cells, floor {}x{} has {}",
            marker.len(),
            floor.width(),
            floor.height(),
            floor.len()
        )));
    }

    let report = match options.propagation {
        Propagation::Fifo => fifo(marker, floor, options.connectivity, cancel)?,
        Propagation::Priority => priority(marker, floor, options.connectivity, cancel)?,
    };
    debug!(
        width = floor.width(),
        height = floor.height(),
        ?options,
        pops = report.pops,
        updates = report.updates,
        "reconstruction converged"
    );
    Ok(report)
}

#[inline]
fn check(cancel: Option<&CancelToken>) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(FloodError::Cancelled),
        _ => Ok(()),
    }
}

// Neighbour indices of `p` that lie inside the grid
#[inline]
fn neighbours<'a>(
    floor: &'a Grid<f64>,
    p: usize,
    offsets: &'a [(isize, isize)],
) -> impl Iterator<Item = usize> + 'a {
    let (row, col) = floor.coords(p);
    let (h, w) = (floor.height() as isize, floor.width() as isize);
    offsets.iter().filter_map(move |&(dy, dx)| {
        let ny = row as isize + dy;
        let nx = col as isize + dx;
        (ny >= 0 && ny < h && nx >= 0 && nx < w).then(|| floor.index(ny as usize, nx as usize))
    })
}

fn fifo(
    marker: &mut [f64],
    floor: &Grid<f64>,
    connectivity: Connectivity,
    cancel: Option<&CancelToken>,
) -> Result<ReconstructionReport> {
    let mask = floor.as_slice();
    let offsets = connectivity.offsets();
    let n = marker.len();

    let mut queue = VecDeque::with_capacity(n);
    let mut queued = vec![false; n];
    for p in floor.border_indices().into_iter().chain(0..n) {
        if !queued[p] {
            queued[p] = true;
            queue.push_back(p);
        }
    }

    let mut report = ReconstructionReport::default();
    while let Some(p) = queue.pop_front() {
        check(cancel)?;
        queued[p] = false;
        report.pops += 1;

        let level = marker[p];
        for q in neighbours(floor, p, offsets) {
            let candidate = level.max(mask[q]);
            if candidate < marker[q] {
                marker[q] = candidate;
                report.updates += 1;
                if !queued[q] {
                    queued[q] = true;
                    queue.push_back(q);
                }
            }
        }
    }
    Ok(report)
}

fn priority(
    marker: &mut [f64],
    floor: &Grid<f64>,
    connectivity: Connectivity,
    cancel: Option<&CancelToken>,
) -> Result<ReconstructionReport> {
    let mask = floor.as_slice();
    let offsets = connectivity.offsets();

    let mut heap: BinaryHeap<Reverse<(Level, usize)>> = marker
        .iter()
        .enumerate()
        .map(|(p, &v)| Reverse((Level(v), p)))
        .collect();

    let mut report = ReconstructionReport::default();
    while let Some(Reverse((Level(level), p))) = heap.pop() {
        check(cancel)?;
        report.pops += 1;
        // stale entry, the cell was lowered after this was pushed
        if level > marker[p] {
            continue;
        }
        for q in neighbours(floor, p, offsets) {
            let candidate = level.max(mask[q]);
            if candidate < marker[q] {
                marker[q] = candidate;
                report.updates += 1;
                heap.push(Reverse((Level(candidate), q)));
            }
        }
    }
    Ok(report)
}
