use crate::error::{FloodError, Result};
use crate::grid::ElevationGrid;

/// Build the erosion marker for `grid` at water level `threshold`.
///
/// Border cells start at their own elevation (the open-water anchor), interior
/// cells at the highest valid elevation in the grid, and every cell at or
/// above the threshold is pinned to its own elevation. The result dominates
/// the grid cell by cell.
///
/// When every valid cell lies below the threshold the interior marker is
/// raised to the threshold itself, so pockets sealed off only by NoData walls
/// still come out dry.
pub fn seed_surface(grid: &ElevationGrid, threshold: f64) -> Result<Vec<f64>> {
    if !threshold.is_finite() {
        return Err(FloodError::non_finite_param("flood threshold", threshold));
    }
    if let Some((row, col, value)) = grid.first_non_finite() {
        return Err(FloodError::non_finite_cell(row, col, value));
    }
    let top = grid.max_valid().ok_or(FloodError::EmptyGrid {
        width: grid.width(),
        height: grid.height(),
    })?;

    let marker = top.max(threshold);

    let cells = grid.grid();
    let seed = grid
        .values()
        .iter()
        .enumerate()
        .map(|(i, &e)| {
            let (row, col) = cells.coords(i);
            if e >= threshold || cells.is_border(row, col) {
                e
            } else {
                // a wall below the threshold still sits above `marker`
                marker.max(e)
            }
        })
        .collect();
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_anchor_interior_high_and_land_pinned() {
        let g = ElevationGrid::from_rows(vec![
            vec![1.0, 2.0, 3.0, 0.5],
            vec![2.0, 0.0, 7.0, 0.5],
            vec![1.0, 6.0, 2.5, 0.5],
            vec![0.0, 0.0, 0.0, 0.5],
        ])
        .unwrap();
        let s = seed_surface(&g, 5.0).unwrap();
        let at = |r: usize, c: usize| s[r * 4 + c];

        assert_eq!(at(0, 2), 3.0);
        assert_eq!(at(3, 0), 0.0);
        // interior below threshold takes the grid maximum
        assert_eq!(at(1, 1), 7.0);
        assert_eq!(at(2, 2), 7.0);
        // interior land pinned
        assert_eq!(at(1, 2), 7.0);
        assert_eq!(at(2, 1), 6.0);
    }

    #[test]
    fn narrow_grids_have_no_interior() {
        let g = ElevationGrid::from_rows(vec![vec![3.0, -1.0], vec![0.0, 2.0]]).unwrap();
        assert_eq!(seed_surface(&g, 1.0).unwrap(), g.values().to_vec());

        let row = ElevationGrid::from_flat(5, 1, vec![4.0, 1.0, 0.0, 2.0, 9.0]).unwrap();
        assert_eq!(seed_surface(&row, 3.0).unwrap(), row.values().to_vec());
    }

    #[test]
    fn all_walls_is_empty() {
        let g = ElevationGrid::from_flat(3, 3, vec![9999.0; 9])
            .unwrap()
            .with_wall(9999.0);
        assert_eq!(
            seed_surface(&g, 1.0).unwrap_err(),
            FloodError::EmptyGrid {
                width: 3,
                height: 3
            }
        );
    }

    #[test]
    fn walls_do_not_raise_the_interior_marker() {
        let mut values = vec![1.0; 9];
        values[0] = 9999.0;
        values[1] = 3.0;
        let g = ElevationGrid::from_flat(3, 3, values)
            .unwrap()
            .with_wall(9999.0);
        let s = seed_surface(&g, 2.0).unwrap();
        assert_eq!(s[4], 3.0);
        assert_eq!(s[0], 9999.0);
    }

    #[test]
    fn marker_never_below_threshold() {
        let g = ElevationGrid::from_flat(3, 3, vec![1.0; 9]).unwrap();
        let s = seed_surface(&g, 4.0).unwrap();
        assert_eq!(s[4], 4.0);
        assert_eq!(s[0], 1.0);
    }

    #[test]
    fn nan_cell_reported_with_position() {
        let g = ElevationGrid::from_rows(vec![vec![1.0, 1.0], vec![1.0, f64::NAN]]).unwrap();
        match seed_surface(&g, 2.0).unwrap_err() {
            FloodError::NonFiniteValue { location, .. } => assert_eq!(location, "row 1, col 1"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn infinite_threshold_rejected() {
        let g = ElevationGrid::from_flat(1, 1, vec![0.0]).unwrap();
        assert!(matches!(
            seed_surface(&g, f64::INFINITY),
            Err(FloodError::NonFiniteValue { .. })
        ));
    }
}
