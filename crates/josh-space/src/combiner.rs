//! [`GridCombiner`]: merging two precomputed grids.

use crate::error::GridError;
use crate::precomputed::PrecomputedGrid;
use josh_units::{UnitRegistry, Units};

/// Combines two precomputed grids into one covering the union of both.
///
/// `spec.md` §4.F: "produces a `Double`-precomputed grid whose extents
/// enclose both inputs and whose timestep range is the union; values
/// are copied from `left` first then overwritten by `right` where both
/// define a cell." Units must be alias-equal across inputs, matching
/// the single surviving version of this type named in `spec.md` §9
/// ("the version in §4.F is the only one that both computes a bounding
/// extents and requires unit equality").
pub struct GridCombiner;

impl GridCombiner {
    /// Combine `left` and `right`, failing with [`GridError::UnitMismatch`]
    /// if their units are not alias-equal under `registry`.
    pub fn combine(
        left: &PrecomputedGrid,
        right: &PrecomputedGrid,
        registry: &UnitRegistry,
    ) -> Result<PrecomputedGrid, GridError> {
        if !registry.units_equal(left.units(), right.units()) {
            return Err(GridError::UnitMismatch {
                left: left.units().canonical_string(),
                right: right.units().canonical_string(),
            });
        }

        let (l_min_x, l_max_x, l_min_y, l_max_y) = left.extents();
        let (r_min_x, r_max_x, r_min_y, r_max_y) = right.extents();
        let min_x = l_min_x.min(r_min_x);
        let max_x = l_max_x.max(r_max_x);
        let min_y = l_min_y.min(r_min_y);
        let max_y = l_max_y.max(r_max_y);

        let (l_min_step, l_max_step) = left.step_range();
        let (r_min_step, r_max_step) = right.step_range();
        let min_step = l_min_step.min(r_min_step);
        let max_step = l_max_step.max(r_max_step);

        let t_count = (max_step - min_step + 1) as usize;
        let h_count = (max_y - min_y + 1) as usize;
        let w_count = (max_x - min_x + 1) as usize;
        let mut values = vec![vec![vec![f64::NAN; w_count]; h_count]; t_count];

        for (src, overwrite) in [(left, false), (right, true)] {
            let (s_min_x, s_max_x, s_min_y, s_max_y) = src.extents();
            let (s_min_step, s_max_step) = src.step_range();
            for step in s_min_step..=s_max_step {
                for y in s_min_y..=s_max_y {
                    for x in s_min_x..=s_max_x {
                        if let Ok(josh_units::Value::Double(v, _)) = src.get_at((x, y), step) {
                            let t = (step - min_step) as usize;
                            let row = (y - min_y) as usize;
                            let col = (x - min_x) as usize;
                            if overwrite || values[t][row][col].is_nan() {
                                values[t][row][col] = v;
                            }
                        }
                    }
                }
            }
        }

        PrecomputedGrid::new(
            min_x,
            max_x,
            min_y,
            max_y,
            min_step,
            max_step,
            left.units().clone(),
            values,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(min_x: i64, max_x: i64, values: Vec<f64>) -> PrecomputedGrid {
        PrecomputedGrid::new(min_x, max_x, 0, 0, 0, 0, Units::base("mm"), vec![vec![values]]).unwrap()
    }

    #[test]
    fn right_overwrites_left_on_overlap() {
        let left = grid(0, 1, vec![1.0, 2.0]);
        let right = grid(1, 2, vec![9.0, 9.0]);
        let registry = UnitRegistry::new();
        let combined = GridCombiner::combine(&left, &right, &registry).unwrap();
        assert_eq!(combined.extents(), (0, 2, 0, 0));
        assert_eq!(
            combined.get_at((0, 0), 0).unwrap(),
            josh_units::Value::Double(1.0, Units::base("mm"))
        );
        assert_eq!(
            combined.get_at((1, 0), 0).unwrap(),
            josh_units::Value::Double(9.0, Units::base("mm"))
        );
    }

    #[test]
    fn mismatched_units_are_rejected() {
        let left = grid(0, 0, vec![1.0]);
        let right = PrecomputedGrid::new(0, 0, 0, 0, 0, 0, Units::base("C"), vec![vec![vec![1.0]]]).unwrap();
        let registry = UnitRegistry::new();
        assert!(matches!(
            GridCombiner::combine(&left, &right, &registry),
            Err(GridError::UnitMismatch { .. })
        ));
    }
}
