//! `GeoKey`: an entity's identity in grid-space.

use crate::id::GridCoord;
use std::fmt;

/// The geometry carried by a [`GeoKey`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    /// A single grid-space cell, `(x, y)`.
    Cell(GridCoord),
    /// A grid-space cell with its projected geographic center
    /// (longitude, latitude), present when the simulation runs in
    /// Earth-space mode.
    CellWithCenter {
        /// The grid-space cell.
        cell: GridCoord,
        /// Projected geographic center, `(longitude, latitude)`.
        center: (f64, f64),
    },
}

impl Geometry {
    /// The grid-space cell, regardless of whether a geographic center is
    /// also carried.
    pub fn cell(&self) -> GridCoord {
        match self {
            Self::Cell(c) => *c,
            Self::CellWithCenter { cell, .. } => *cell,
        }
    }

    /// The projected geographic center, if this geometry carries one.
    pub fn center(&self) -> Option<(f64, f64)> {
        match self {
            Self::Cell(_) => None,
            Self::CellWithCenter { center, .. } => Some(*center),
        }
    }
}

/// An entity's identity in grid-space: geometry plus a type-name tag.
///
/// `spec.md` §3: "geometry + type-name tag". Two `GeoKey`s are equal iff
/// both the geometry and the type tag match — two different entity kinds
/// built at the same coordinate (a patch and, say, a future tile overlay)
/// never collide.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoKey {
    geometry: Geometry,
    type_name: String,
}

impl GeoKey {
    /// Construct a `GeoKey` for a bare grid cell.
    pub fn for_cell(type_name: impl Into<String>, cell: GridCoord) -> Self {
        Self {
            geometry: Geometry::Cell(cell),
            type_name: type_name.into(),
        }
    }

    /// Construct a `GeoKey` carrying a projected geographic center.
    pub fn for_cell_with_center(
        type_name: impl Into<String>,
        cell: GridCoord,
        center: (f64, f64),
    ) -> Self {
        Self {
            geometry: Geometry::CellWithCenter { cell, center },
            type_name: type_name.into(),
        }
    }

    /// The geometry carried by this key.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The grid-space cell this key identifies.
    pub fn cell(&self) -> GridCoord {
        self.geometry.cell()
    }

    /// The entity-type-name tag (e.g. the patch or organism prototype name).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl fmt::Display for GeoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.geometry.cell();
        write!(f, "{}@({x},{y})", self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_requires_matching_type_name() {
        let a = GeoKey::for_cell("Default", (1, 2));
        let b = GeoKey::for_cell("Other", (1, 2));
        assert_ne!(a, b);
    }

    #[test]
    fn center_present_only_for_earth_space_keys() {
        let plain = GeoKey::for_cell("Default", (0, 0));
        assert!(plain.geometry().center().is_none());

        let earth = GeoKey::for_cell_with_center("Default", (0, 0), (12.5, -3.0));
        assert_eq!(earth.geometry().center(), Some((12.5, -3.0)));
    }
}
