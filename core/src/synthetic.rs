use crate::error::{FloodError, Result};
use crate::grid::ElevationGrid;

// Reproducible fractal terrain from the Diamond–Square algorithm.
// Used for demos, benchmarks and randomised tests where no DEM is at hand.
pub struct DiamondSquare {
    size: usize, // must be 2^n + 1, e.g. 129, 257
    seed: u64,
    roughness: f64, // how fast the random offset shrinks each step
}

impl DiamondSquare {
    pub fn new(size: usize, seed: u64, roughness: f64) -> Result<Self> {
        if size < 3 || !(size - 1).is_power_of_two() {
            return Err(FloodError::InvalidGrid(format!(
                "diamond-square size must be 2^n+1, got {size}"
            )));
        }
        Ok(Self {
            size,
            seed,
            roughness,
        })
    }

    // Terrain stretched linearly onto [low, high]
    pub fn generate(&self, low: f64, high: f64) -> Result<ElevationGrid> {
        let n = self.size;
        let mut map = vec![0.0f64; n * n];
        let at = |y: usize, x: usize| y * n + x;
        let mut rng = XorShift::new(self.seed);

        map[at(0, 0)] = rng.signed();
        map[at(0, n - 1)] = rng.signed();
        map[at(n - 1, 0)] = rng.signed();
        map[at(n - 1, n - 1)] = rng.signed();

        let mut step = n - 1;
        let mut offset = 1.0;
        while step > 1 {
            let half = step / 2;

            // Diamond step: square centres from their four corners
            for y in (0..n - 1).step_by(step) {
                for x in (0..n - 1).step_by(step) {
                    let avg = (map[at(y, x)]
                        + map[at(y, x + step)]
                        + map[at(y + step, x)]
                        + map[at(y + step, x + step)])
                        * 0.25;
                    map[at(y + half, x + half)] = avg + rng.signed() * offset;
                }
            }

            // Square step: edge midpoints from whichever neighbours exist
            for y in (0..n).step_by(half) {
                for x in ((y + half) % step..n).step_by(step) {
                    let mut sum = 0.0;
                    let mut cnt = 0;
                    if x >= half {
                        sum += map[at(y, x - half)];
                        cnt += 1;
                    }
                    if x + half < n {
                        sum += map[at(y, x + half)];
                        cnt += 1;
                    }
                    if y >= half {
                        sum += map[at(y - half, x)];
                        cnt += 1;
                    }
                    if y + half < n {
                        sum += map[at(y + half, x)];
                        cnt += 1;
                    }
                    map[at(y, x)] = sum / cnt as f64 + rng.signed() * offset;
                }
            }

            step = half;
            offset *= self.roughness;
        }

        stretch(&mut map, low, high);
        ElevationGrid::from_flat(n, n, map)
    }
}

/// Square test coast with known answers.
///
/// The outer ring is sea at 0.0 and most land sits at 3.0. A ridge at 6.0
/// encloses a central basin at 1.0, and a 1.0 channel runs along the middle
/// row from the west coast to the ridge. For any water level between 1.0 and
/// 3.0 the channel floods while the basin, though just as low, stays dry.
pub fn coastal_basin(size: usize) -> Result<ElevationGrid> {
    if size < 7 {
        return Err(FloodError::InvalidGrid(format!(
            "coastal basin needs at least 7x7 cells, got {size}"
        )));
    }
    let c = size / 2;
    let r = (size / 4).max(2);
    let mut map = vec![3.0; size * size];
    for y in 0..size {
        for x in 0..size {
            let d = y.abs_diff(c).max(x.abs_diff(c));
            map[y * size + x] = if y == 0 || x == 0 || y == size - 1 || x == size - 1 {
                0.0
            } else if d == r {
                6.0
            } else if d < r || (y == c && x < c - r) {
                1.0
            } else {
                3.0
            };
        }
    }
    ElevationGrid::from_flat(size, size, map)
}

fn stretch(map: &mut [f64], low: f64, high: f64) {
    let (min, max) = map
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = (max - min).max(1e-9); // prevent zero-division
    for v in map.iter_mut() {
        *v = low + (*v - min) / range * (high - low);
    }
}

/// Small xorshift generator; good enough for terrain and test fixtures.
#[derive(Debug, Clone)]
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        const MIX: u64 = 0xCAFE_BABE_1234_5678;
        // zero state would stay zero forever
        let state = seed ^ MIX;
        Self(if state == 0 { MIX } else { state })
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    // Uniform in [0, 1)
    pub fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    // Uniform in [-1, 1)
    pub fn signed(&mut self) -> f64 {
        self.unit() * 2.0 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_and_range() {
        let g = DiamondSquare::new(33, 7, 0.5)
            .unwrap()
            .generate(-5.0, 20.0)
            .unwrap();
        assert_eq!((g.width(), g.height()), (33, 33));
        for &v in g.values() {
            assert!((-5.0 - 1e-9..=20.0 + 1e-9).contains(&v), "value {v} out of range");
        }
    }

    #[test]
    fn determinism() {
        let a = DiamondSquare::new(65, 42, 0.8).unwrap().generate(0.0, 1.0);
        let b = DiamondSquare::new(65, 42, 0.8).unwrap().generate(0.0, 1.0);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn size_must_be_power_of_two_plus_one() {
        assert!(DiamondSquare::new(64, 0, 1.0).is_err());
        assert!(DiamondSquare::new(2, 0, 1.0).is_err());
    }

    #[test]
    fn coastal_basin_channel_floods_and_basin_stays_dry() {
        use crate::engine::{ConnectedFloodEngine, naive_mask};

        let grid = coastal_basin(17).unwrap();
        let mask = ConnectedFloodEngine::default()
            .flood_mask(&grid, 2.0)
            .unwrap();
        // centre of the basin: low, but sealed by the ridge
        assert_eq!(grid.get(8, 8), Some(1.0));
        assert_eq!(mask.get(8, 8), Some(&false));
        assert_eq!(naive_mask(&grid, 2.0).get(8, 8), Some(&true));
        // channel reaches the ridge from the coast
        assert_eq!(mask.get(8, 1), Some(&true));
        assert_eq!(mask.get(8, 3), Some(&true));
        assert_eq!(mask.get(8, 4), Some(&false));
        // ordinary land
        assert_eq!(mask.get(2, 2), Some(&false));
        assert!(coastal_basin(5).is_err());
    }

    #[test]
    fn unit_samples_stay_in_range() {
        let mut rng = XorShift::new(0);
        for _ in 0..1000 {
            let u = rng.unit();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
