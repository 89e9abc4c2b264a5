//! [`PrecomputedGrid`]: the `.jshd` binary external-data format.

use crate::error::{GridAxis, GridError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use josh_core::GridCoord;
use josh_units::{UnitRegistry, Units, Value};

const VERSION: u32 = 1;
const MAX_UNITS_LEN: usize = 200;

/// A 3-D array `values[t][y][x]` of `f64`, plus the extents, timestep
/// range and units string it was recorded with (`spec.md` §4.F, §6).
#[derive(Clone, Debug, PartialEq)]
pub struct PrecomputedGrid {
    min_x: i64,
    max_x: i64,
    min_y: i64,
    max_y: i64,
    min_step: i64,
    max_step: i64,
    units: Units,
    /// `values[t][y][x]`, `t` indexed from 0 over `[min_step, max_step]`,
    /// `y`/`x` indexed from 0 over the grid's height/width.
    values: Vec<Vec<Vec<f64>>>,
}

impl PrecomputedGrid {
    /// Construct a grid directly from an already-shaped 3-D array,
    /// validating extents and array dimensions agree.
    pub fn new(
        min_x: i64,
        max_x: i64,
        min_y: i64,
        max_y: i64,
        min_step: i64,
        max_step: i64,
        units: Units,
        values: Vec<Vec<Vec<f64>>>,
    ) -> Result<Self, GridError> {
        if max_x < min_x || max_y < min_y || max_step < min_step {
            return Err(GridError::InvalidExtents {
                reason: "max must not be less than min on any axis".to_string(),
            });
        }
        let expected_t = (max_step - min_step + 1) as usize;
        let expected_h = (max_y - min_y + 1) as usize;
        let expected_w = (max_x - min_x + 1) as usize;
        if values.len() != expected_t
            || values.iter().any(|plane| plane.len() != expected_h)
            || values
                .iter()
                .flatten()
                .any(|row| row.len() != expected_w)
        {
            return Err(GridError::InvalidExtents {
                reason: format!(
                    "values array does not match extents {expected_t}x{expected_h}x{expected_w}"
                ),
            });
        }
        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
            min_step,
            max_step,
            units,
            values,
        })
    }

    /// The grid-space extents this grid covers.
    pub fn extents(&self) -> (i64, i64, i64, i64) {
        (self.min_x, self.max_x, self.min_y, self.max_y)
    }

    /// The inclusive timestep range this grid covers.
    pub fn step_range(&self) -> (i64, i64) {
        (self.min_step, self.max_step)
    }

    /// The units every cell is recorded in.
    pub fn units(&self) -> &Units {
        &self.units
    }

    /// `DataGridLayer::get_at(location, step)` (`spec.md` §4.F): the
    /// cell value at `location` and `step`, or a bounds error.
    pub fn get_at(&self, location: GridCoord, step: i64) -> Result<Value, GridError> {
        let (x, y) = location;
        if x < self.min_x || x > self.max_x {
            return Err(GridError::GridOutOfBounds {
                axis: GridAxis::Horizontal,
                value: x,
                min: self.min_x,
                max: self.max_x,
            });
        }
        if y < self.min_y || y > self.max_y {
            return Err(GridError::GridOutOfBounds {
                axis: GridAxis::Vertical,
                value: y,
                min: self.min_y,
                max: self.max_y,
            });
        }
        if step < self.min_step || step > self.max_step {
            return Err(GridError::GridOutOfBounds {
                axis: GridAxis::Timestep,
                value: step,
                min: self.min_step,
                max: self.max_step,
            });
        }
        let t = (step - self.min_step) as usize;
        let row = (y - self.min_y) as usize;
        let col = (x - self.min_x) as usize;
        Ok(Value::Double(self.values[t][row][col], self.units.clone()))
    }

    /// `is_compatible(extents, min_step, max_step)` (`spec.md` §4.F):
    /// whether this grid fully contains the requested region and
    /// window.
    pub fn is_compatible(
        &self,
        extents: (i64, i64, i64, i64),
        min_step: i64,
        max_step: i64,
    ) -> bool {
        let (qmin_x, qmax_x, qmin_y, qmax_y) = extents;
        qmin_x >= self.min_x
            && qmax_x <= self.max_x
            && qmin_y >= self.min_y
            && qmax_y <= self.max_y
            && min_step >= self.min_step
            && max_step <= self.max_step
    }

    /// Serialize to the exact `.jshd` byte layout: big-endian `u32`
    /// version, six big-endian `i64` extents/step fields, a `u32`
    /// units length, the units bytes, then `f64` values in `(t, y, x)`
    /// row-major order.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GridError> {
        let units_bytes = self.units.canonical_string().into_bytes();
        if units_bytes.len() > MAX_UNITS_LEN {
            return Err(GridError::UnitsTooLong {
                len: units_bytes.len(),
            });
        }
        let mut out = Vec::new();
        out.extend_from_slice(&VERSION.to_be_bytes());
        for field in [
            self.min_x,
            self.max_x,
            self.min_y,
            self.max_y,
            self.min_step,
            self.max_step,
        ] {
            out.extend_from_slice(&field.to_be_bytes());
        }
        out.extend_from_slice(&(units_bytes.len() as u32).to_be_bytes());
        out.extend_from_slice(&units_bytes);
        for plane in &self.values {
            for row in plane {
                for &v in row {
                    out.extend_from_slice(&v.to_be_bytes());
                }
            }
        }
        Ok(out)
    }

    /// Parse the exact `.jshd` byte layout, validating the version tag
    /// and the units-string length before materializing the 3-D array
    /// eagerly.
    pub fn from_bytes(bytes: &[u8], registry: &UnitRegistry) -> Result<Self, GridError> {
        let mut cursor = Cursor::new(bytes);
        let version = cursor.read_u32()?;
        if version != VERSION {
            return Err(GridError::UnsupportedVersion { found: version });
        }
        let min_x = cursor.read_i64()?;
        let max_x = cursor.read_i64()?;
        let min_y = cursor.read_i64()?;
        let max_y = cursor.read_i64()?;
        let min_step = cursor.read_i64()?;
        let max_step = cursor.read_i64()?;
        let units_len = cursor.read_u32()? as usize;
        if units_len > MAX_UNITS_LEN {
            return Err(GridError::UnitsTooLong { len: units_len });
        }
        let units_bytes = cursor.read_bytes(units_len)?;
        let units_str = String::from_utf8_lossy(units_bytes).into_owned();
        let units = registry.parse(&units_str);

        let t_count = (max_step - min_step + 1).max(0) as usize;
        let h_count = (max_y - min_y + 1).max(0) as usize;
        let w_count = (max_x - min_x + 1).max(0) as usize;
        let mut values = Vec::with_capacity(t_count);
        for _ in 0..t_count {
            let mut plane = Vec::with_capacity(h_count);
            for _ in 0..h_count {
                let mut row = Vec::with_capacity(w_count);
                for _ in 0..w_count {
                    row.push(cursor.read_f64()?);
                }
                plane.push(row);
            }
            values.push(plane);
        }

        Self::new(min_x, max_x, min_y, max_y, min_step, max_step, units, values)
    }

    /// Base64-wrap the binary form with no line breaks, for embedding
    /// in text-based transports (`spec.md` §6).
    pub fn to_base64(&self) -> Result<String, GridError> {
        Ok(BASE64.encode(self.to_bytes()?))
    }

    /// Decode a base64-wrapped `.jshd` payload and parse it.
    pub fn from_base64(encoded: &str, registry: &UnitRegistry) -> Result<Self, GridError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| GridError::InvalidBase64 { reason: e.to_string() })?;
        Self::from_bytes(&bytes, registry)
    }
}

/// A minimal big-endian byte cursor, since the `.jshd` format is fixed
/// and small enough that pulling in a byte-order crate would add a
/// dependency for six call sites.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], GridError> {
        let end = self.pos.checked_add(len).ok_or(GridError::TruncatedBinary)?;
        let slice = self.bytes.get(self.pos..end).ok_or(GridError::TruncatedBinary)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, GridError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes(b.try_into().expect("length checked above")))
    }

    fn read_i64(&mut self) -> Result<i64, GridError> {
        let b = self.read_bytes(8)?;
        Ok(i64::from_be_bytes(b.try_into().expect("length checked above")))
    }

    fn read_f64(&mut self) -> Result<f64, GridError> {
        let b = self.read_bytes(8)?;
        Ok(f64::from_be_bytes(b.try_into().expect("length checked above")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PrecomputedGrid {
        PrecomputedGrid::new(
            0,
            1,
            0,
            0,
            0,
            1,
            Units::base("mm"),
            vec![vec![vec![1.0, 2.0]], vec![vec![3.0, 4.0]]],
        )
        .unwrap()
    }

    #[test]
    fn round_trips_through_bytes() {
        let grid = sample();
        let bytes = grid.to_bytes().unwrap();
        let registry = UnitRegistry::new();
        let parsed = PrecomputedGrid::from_bytes(&bytes, &registry).unwrap();
        assert_eq!(parsed.get_at((1, 0), 1).unwrap(), Value::Double(4.0, Units::base("mm")));
    }

    #[test]
    fn round_trips_through_base64() {
        let grid = sample();
        let encoded = grid.to_base64().unwrap();
        let registry = UnitRegistry::new();
        let parsed = PrecomputedGrid::from_base64(&encoded, &registry).unwrap();
        assert_eq!(parsed, grid);
    }

    #[test]
    fn rejects_wrong_version() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[0..4].copy_from_slice(&99u32.to_be_bytes());
        let registry = UnitRegistry::new();
        assert_eq!(
            PrecomputedGrid::from_bytes(&bytes, &registry),
            Err(GridError::UnsupportedVersion { found: 99 })
        );
    }

    #[test]
    fn rejects_truncated_stream() {
        let bytes = sample().to_bytes().unwrap();
        let registry = UnitRegistry::new();
        assert_eq!(
            PrecomputedGrid::from_bytes(&bytes[..bytes.len() - 3], &registry),
            Err(GridError::TruncatedBinary)
        );
    }

    #[test]
    fn out_of_bounds_timestep_is_distinct_from_coord_error() {
        let grid = sample();
        assert_eq!(
            grid.get_at((0, 0), 5),
            Err(GridError::GridOutOfBounds { axis: GridAxis::Timestep, value: 5, min: 0, max: 1 })
        );
        assert_eq!(
            grid.get_at((9, 0), 0),
            Err(GridError::GridOutOfBounds { axis: GridAxis::Horizontal, value: 9, min: 0, max: 1 })
        );
    }
}
