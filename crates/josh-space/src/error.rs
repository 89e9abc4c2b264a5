//! Errors from grid construction, loading and querying.

use std::fmt;

/// Which axis a [`GridError::GridOutOfBounds`] was raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAxis {
    /// The `x` coordinate, checked against `[min_x, max_x]`.
    Horizontal,
    /// The `y` coordinate, checked against `[min_y, max_y]`.
    Vertical,
    /// The timestep, checked against `[min_step, max_step]`.
    Timestep,
}

impl fmt::Display for GridAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
            Self::Timestep => write!(f, "timestep"),
        }
    }
}

/// Errors arising from the precomputed grid layer and patch-grid
/// geometry (`spec.md` §4.F, §7).
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// The `.jshd` units string exceeds the 200-byte limit.
    UnitsTooLong {
        /// The length actually encountered.
        len: usize,
    },
    /// The `.jshd` version field was not `1`.
    UnsupportedVersion {
        /// The version field actually read.
        found: u32,
    },
    /// The byte stream ended before a complete grid could be read.
    TruncatedBinary,
    /// A base64-wrapped `.jshd` payload was not valid base64.
    InvalidBase64 {
        /// The underlying decode error, rendered as text.
        reason: String,
    },
    /// A lookup's `x`/`y` location or timestep fell outside the grid's
    /// recorded coverage on one axis.
    GridOutOfBounds {
        /// Which axis was out of range.
        axis: GridAxis,
        /// The offending value on that axis.
        value: i64,
        /// The axis's covered range, inclusive lower bound.
        min: i64,
        /// The axis's covered range, inclusive upper bound.
        max: i64,
    },
    /// Two grids (or a grid and a query) disagree on units and neither
    /// registered alias makes them equal.
    UnitMismatch {
        /// The first grid's (or query's) units, rendered for
        /// diagnostics.
        left: String,
        /// The second's.
        right: String,
    },
    /// Extents or timestep range are malformed (e.g. `max_x < min_x`).
    InvalidExtents {
        /// What is wrong.
        reason: String,
    },
    /// An [`crate::InputGetterStrategy`] could not resolve a logical
    /// name to bytes.
    NotFound {
        /// The logical name that failed to resolve.
        name: String,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnitsTooLong { len } => {
                write!(f, "units string is {len} bytes, exceeding the 200-byte limit")
            }
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported .jshd version {found}, expected 1")
            }
            Self::TruncatedBinary => write!(f, "truncated .jshd binary stream"),
            Self::InvalidBase64 { reason } => write!(f, "invalid base64 payload: {reason}"),
            Self::GridOutOfBounds { axis: GridAxis::Timestep, value, min, max } => write!(
                f,
                "timestep {value} outside precomputed grid's step range [{min}, {max}]"
            ),
            Self::GridOutOfBounds { axis, value, min, max } => write!(
                f,
                "{axis} coordinate {value} outside grid extents [{min}, {max}]"
            ),
            Self::UnitMismatch { left, right } => {
                write!(f, "unit mismatch: '{left}' is not alias-equal to '{right}'")
            }
            Self::InvalidExtents { reason } => write!(f, "invalid extents: {reason}"),
            Self::NotFound { name } => write!(f, "no data resolves to logical name '{name}'"),
        }
    }
}

impl std::error::Error for GridError {}
