use palette::{Gradient, LinSrgb};

use crate::grid::{ElevationGrid, FloodMask};

const WALL_RGB: [u8; 3] = [40, 40, 40];
const SHALLOW_RGB: [u8; 3] = [90, 170, 255];
const DEEP_RGB: [u8; 3] = [0, 40, 140];
// water deeper than this is drawn fully dark
const DEPTH_FOR_DARKEST: f64 = 5.0;

// Linearly interpolate between two RGB triples
fn lerp_color(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    [
        (a[0] as f32 + (b[0] as f32 - a[0] as f32) * t) as u8,
        (a[1] as f32 + (b[1] as f32 - a[1] as f32) * t) as u8,
        (a[2] as f32 + (b[2] as f32 - a[2] as f32) * t) as u8,
    ]
}

// Land colours from low-lying sand up to high ground
fn land_gradient() -> Gradient<LinSrgb> {
    Gradient::with_domain(vec![
        (0.00, LinSrgb::new(0.8, 0.8, 0.5)), // sand
        (0.30, LinSrgb::new(0.1, 0.6, 0.2)), // green
        (0.75, LinSrgb::new(0.5, 0.4, 0.3)), // rock
        (1.00, LinSrgb::new(1.0, 1.0, 1.0)), // snow
    ])
}

/// RGB8 buffer (row-major, 3 bytes per cell) showing flooded cells in blue
/// shaded by water depth, dry land on an elevation gradient and NoData walls
/// in dark grey.
pub fn flood_preview_rgb(grid: &ElevationGrid, mask: &FloodMask, threshold: f64) -> Vec<u8> {
    let gradient = land_gradient();

    let (min, max) = grid
        .values()
        .iter()
        .filter(|&&v| !grid.is_wall(v))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = (max - min).max(1e-3);

    let mut buf = Vec::with_capacity(grid.len() * 3);
    for (&e, &flooded) in grid.values().iter().zip(mask.as_slice()) {
        let rgb = if grid.is_wall(e) {
            WALL_RGB
        } else if flooded {
            let depth = ((threshold - e) / DEPTH_FOR_DARKEST).clamp(0.0, 1.0);
            lerp_color(SHALLOW_RGB, DEEP_RGB, depth as f32)
        } else {
            let norm = ((e - min) / range).clamp(0.0, 1.0);
            let col = gradient.get(norm as f32).into_format::<u8>();
            [col.red, col.green, col.blue]
        };
        buf.extend_from_slice(&rgb);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn colours_by_cell_class() {
        let grid = ElevationGrid::from_flat(3, 1, vec![0.0, 9999.0, 4.0])
            .unwrap()
            .with_wall(9999.0);
        let mask = Grid::from_flat(3, 1, vec![true, false, false]).unwrap();
        let rgb = flood_preview_rgb(&grid, &mask, 1.0);
        assert_eq!(rgb.len(), 9);
        // flooded cell is blue-dominant
        assert!(rgb[2] > rgb[0]);
        assert_eq!(&rgb[3..6], &WALL_RGB);
        // highest land cell maps to the top of the gradient (white)
        assert_eq!(&rgb[6..9], &[255, 255, 255]);
    }
}
