//! Error types for the typed value algebra.

use std::error::Error;
use std::fmt;

/// Errors from unit and value arithmetic.
///
/// Maps the `spec.md` §7 error table entries attributed to §4.A.
#[derive(Clone, Debug, PartialEq)]
pub enum UnitsError {
    /// `add`/`subtract`/comparison operands are not alias-equal, or `cast`
    /// found neither an identity nor a declared conversion path.
    UnitMismatch {
        /// The left-hand operand's units.
        left: String,
        /// The right-hand operand's units.
        right: String,
    },
    /// `raiseToPower` was called with a dimensioned base and a
    /// non-dimensionless or non-integer exponent.
    UnsupportedPower {
        /// The base's units.
        base_units: String,
    },
    /// Division by a zero numeric operand.
    DivideByZero,
    /// A reduction (`mean`, `std`, `min`, `max`, `sum`, ...) was requested
    /// on a distribution with zero elements.
    EmptyDistribution,
    /// `sample_without_replacement` was asked for more elements than the
    /// population contains.
    SampleWithoutReplacementExceedsPopulation {
        /// Number of elements requested.
        requested: usize,
        /// Number of elements available.
        population: usize,
    },
}

impl fmt::Display for UnitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnitMismatch { left, right } => {
                write!(f, "unit mismatch: '{left}' is not compatible with '{right}'")
            }
            Self::UnsupportedPower { base_units } => {
                write!(
                    f,
                    "cannot raise a value with units '{base_units}' to a non-integer or dimensioned power"
                )
            }
            Self::DivideByZero => write!(f, "division by zero"),
            Self::EmptyDistribution => {
                write!(f, "reduction requested on an empty distribution")
            }
            Self::SampleWithoutReplacementExceedsPopulation {
                requested,
                population,
            } => write!(
                f,
                "requested {requested} samples without replacement from a population of {population}"
            ),
        }
    }
}

impl Error for UnitsError {}
