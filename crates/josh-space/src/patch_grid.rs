//! [`PatchGrid`]: the rectangular set of patch coordinates a simulation
//! steps over.

use josh_core::{GeoKey, GridCoord};

/// The grid-space rectangle `[min_x, max_x] x [min_y, max_y]` a
/// simulation's patches are materialized across (`spec.md` §4.H: "Patch
/// set construction").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatchGrid {
    min_x: i64,
    max_x: i64,
    min_y: i64,
    max_y: i64,
}

impl PatchGrid {
    /// Build a patch grid over the given inclusive bounds.
    pub fn new(min_x: i64, max_x: i64, min_y: i64, max_y: i64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// The inclusive bounds this grid covers.
    pub fn extents(&self) -> (i64, i64, i64, i64) {
        (self.min_x, self.max_x, self.min_y, self.max_y)
    }

    /// Total number of patches (may be zero if either axis is empty).
    pub fn patch_count(&self) -> u64 {
        if self.max_x < self.min_x || self.max_y < self.min_y {
            return 0;
        }
        (self.max_x - self.min_x + 1) as u64 * (self.max_y - self.min_y + 1) as u64
    }

    /// Every grid-space coordinate in this grid, in row-major order
    /// (`y` then `x`), matching the deterministic iteration order the
    /// stepper relies on when assigning patches to workers.
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (self.min_y..=self.max_y)
            .flat_map(move |y| (self.min_x..=self.max_x).map(move |x| (x, y)))
    }

    /// Build the `GeoKey` for one cell of this grid, tagged with the
    /// patch prototype's type name.
    pub fn key_for(&self, type_name: impl Into<String>, cell: GridCoord) -> GeoKey {
        GeoKey::for_cell(type_name, cell)
    }

    /// Build the `GeoKey` for one cell, carrying a projected Earth-space
    /// center, for simulations running in Earth-space mode.
    pub fn key_for_with_center(
        &self,
        type_name: impl Into<String>,
        cell: GridCoord,
        center: (f64, f64),
    ) -> GeoKey {
        GeoKey::for_cell_with_center(type_name, cell, center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_patches_over_a_rectangle() {
        let grid = PatchGrid::new(0, 2, 0, 1);
        assert_eq!(grid.patch_count(), 6);
        assert_eq!(grid.coords().count(), 6);
    }

    #[test]
    fn empty_grid_when_max_below_min() {
        let grid = PatchGrid::new(5, 0, 0, 0);
        assert_eq!(grid.patch_count(), 0);
    }

    #[test]
    fn coords_iterate_row_major() {
        let grid = PatchGrid::new(0, 1, 0, 1);
        let coords: Vec<_> = grid.coords().collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }
}
