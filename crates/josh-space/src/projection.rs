//! Earth↔grid coordinate projection (`spec.md` §4.F).

use crate::error::GridError;
use josh_core::GridCoord;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two `(longitude, latitude)`
/// points given in degrees.
pub fn haversine_meters(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lon1, lat1) = from;
    let (lon2, lat2) = to;
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_METERS * c
}

/// Normalized Earth-space extents: `top_left` and `bottom_right` given
/// as `(longitude, latitude)` in degrees, with `bottom_right`'s
/// longitude east of and latitude south of `top_left`'s.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EarthExtents {
    /// Top-left corner, `(longitude, latitude)` in degrees.
    pub top_left: (f64, f64),
    /// Bottom-right corner, `(longitude, latitude)` in degrees.
    pub bottom_right: (f64, f64),
}

impl EarthExtents {
    /// Build extents from two arbitrary corners, normalizing so that
    /// `top_left` is the north-west point and `bottom_right` the
    /// south-east point (`spec.md` §4.F: "`min_x = min(left, right)`
    /// and similarly for y").
    pub fn normalized(a: (f64, f64), b: (f64, f64)) -> Self {
        let min_lon = a.0.min(b.0);
        let max_lon = a.0.max(b.0);
        let max_lat = a.1.max(b.1);
        let min_lat = a.1.min(b.1);
        Self {
            top_left: (min_lon, max_lat),
            bottom_right: (max_lon, min_lat),
        }
    }
}

/// Computes grid width/height for an [`EarthExtents`] region given a
/// patch's side length in meters.
///
/// `spec.md` §4.F: "the extents transformer computes grid width/height
/// via haversine distance (east from top-left; south from top-left)
/// divided by patch width, with ceiling rounding."
pub struct ExtentsTransformer {
    extents: EarthExtents,
    patch_width_meters: f64,
}

impl ExtentsTransformer {
    /// Build a transformer for the given extents and patch width.
    pub fn new(extents: EarthExtents, patch_width_meters: f64) -> Result<Self, GridError> {
        if patch_width_meters <= 0.0 {
            return Err(GridError::InvalidExtents {
                reason: "patch width must be positive".to_string(),
            });
        }
        Ok(Self {
            extents,
            patch_width_meters,
        })
    }

    /// Grid width in whole patches, east to west.
    pub fn grid_width(&self) -> u64 {
        let east_point = (self.extents.bottom_right.0, self.extents.top_left.1);
        let meters = haversine_meters(self.extents.top_left, east_point);
        (meters / self.patch_width_meters).ceil() as u64
    }

    /// Grid height in whole patches, north to south.
    pub fn grid_height(&self) -> u64 {
        let south_point = (self.extents.top_left.0, self.extents.bottom_right.1);
        let meters = haversine_meters(self.extents.top_left, south_point);
        (meters / self.patch_width_meters).ceil() as u64
    }
}

/// Maps a geographic point to a zero-indexed `(grid_x, grid_y)` cell,
/// by the same east/south haversine method as [`ExtentsTransformer`].
pub struct PatchKeyConverter {
    extents: EarthExtents,
    patch_width_meters: f64,
}

impl PatchKeyConverter {
    /// Build a converter for the given extents and patch width.
    pub fn new(extents: EarthExtents, patch_width_meters: f64) -> Result<Self, GridError> {
        if patch_width_meters <= 0.0 {
            return Err(GridError::InvalidExtents {
                reason: "patch width must be positive".to_string(),
            });
        }
        Ok(Self {
            extents,
            patch_width_meters,
        })
    }

    /// Convert a `(longitude, latitude)` point to a zero-indexed grid
    /// cell.
    pub fn to_grid_coord(&self, point: (f64, f64)) -> GridCoord {
        let east_point = (point.0, self.extents.top_left.1);
        let east_meters = haversine_meters(self.extents.top_left, east_point);
        let south_point = (self.extents.top_left.0, point.1);
        let south_meters = haversine_meters(self.extents.top_left, south_point);
        let x = (east_meters / self.patch_width_meters).floor() as i64;
        let y = (south_meters / self.patch_width_meters).floor() as i64;
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_extents_pick_north_west_and_south_east_corners() {
        let extents = EarthExtents::normalized((10.0, 5.0), (0.0, 15.0));
        assert_eq!(extents.top_left, (0.0, 15.0));
        assert_eq!(extents.bottom_right, (10.0, 5.0));
    }

    #[test]
    fn grid_dimensions_are_at_least_one_patch_wide() {
        let extents = EarthExtents::normalized((0.0, 1.0), (0.01, 0.0));
        let transformer = ExtentsTransformer::new(extents, 100.0).unwrap();
        assert!(transformer.grid_width() >= 1);
        assert!(transformer.grid_height() >= 1);
    }

    #[test]
    fn top_left_point_maps_to_origin() {
        let extents = EarthExtents::normalized((0.0, 1.0), (1.0, 0.0));
        let converter = PatchKeyConverter::new(extents, 1000.0).unwrap();
        assert_eq!(converter.to_grid_coord((0.0, 1.0)), (0, 0));
    }

    #[test]
    fn haversine_distance_is_zero_for_identical_points() {
        assert_eq!(haversine_meters((10.0, 20.0), (10.0, 20.0)), 0.0);
    }
}
