//! Errors from compiled handler execution.

use josh_units::UnitsError;
use std::error::Error;
use std::fmt;

/// Errors raised while executing a compiled handler's op stream.
#[derive(Clone, Debug, PartialEq)]
pub enum HandlerError {
    /// An arithmetic, unit, or distribution operation failed.
    Units(UnitsError),
    /// The op stream popped from an empty stack — a compiler invariant
    /// violation, surfaced rather than panicking.
    StackUnderflow,
    /// `pushAttribute`/nested scope resolution failed; carries the scope's
    /// message (e.g. `MissingAttribute`, propagated from the caller).
    ScopeError(String),
    /// `applyMap` referenced a map method name the engine does not
    /// recognize (only `linear` and `sigmoid` are built in).
    UnknownMapMethod(String),
    /// A value of the wrong shape reached an op that required a specific
    /// one (e.g. `concat` on a non-string, `not` on a non-boolean).
    TypeMismatch {
        /// What the op expected.
        expected: &'static str,
        /// What it got, rendered for diagnostics.
        found: String,
    },
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Units(e) => write!(f, "{e}"),
            Self::StackUnderflow => write!(f, "stack underflow evaluating compiled handler"),
            Self::ScopeError(msg) => write!(f, "{msg}"),
            Self::UnknownMapMethod(name) => write!(f, "unknown map method '{name}'"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
        }
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Units(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UnitsError> for HandlerError {
    fn from(e: UnitsError) -> Self {
        Self::Units(e)
    }
}
