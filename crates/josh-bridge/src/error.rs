//! Errors raised by the engine bridge, query cache, configuration lookup,
//! and precomputed-grid loading.

use josh_handler::HandlerError;
use josh_space::GridError;
use std::error::Error;
use std::fmt;

/// Errors the bridge surfaces to a calling handler or stepper.
///
/// `spec.md` §7 names `SimulationNotFound`, `ExternalDataNotFound`, and
/// `UnsupportedExternalFormat` as bridge-level errors distinct from the
/// resolution-layer errors (`MissingAttribute`, `ResolutionLoop`) that
/// never escape `josh-shadow`, and from the grid-layer errors
/// (`GridOutOfBounds`, `UnitsTooLong`, ...) already modeled by
/// [`GridError`].
#[derive(Clone, Debug, PartialEq)]
pub enum BridgeError {
    /// A compiled handler's op stream failed.
    Handler(HandlerError),
    /// A precomputed grid or `.jshd` byte stream failed to parse or was
    /// queried out of range on a spatial axis.
    Grid(GridError),
    /// `sample_precomputed` was asked for a timestep the grid has no
    /// data for. Names both the grid's own step coverage and the
    /// simulation's step range, since a grid loaded for a shorter or
    /// longer run than it was recorded for may disagree with either.
    PrecomputedStepOutOfRange {
        /// The precomputed grid's logical name.
        name: String,
        /// The requested timestep.
        value: i64,
        /// The grid's own covered range, inclusive lower bound.
        grid_min: i64,
        /// The grid's own covered range, inclusive upper bound.
        grid_max: i64,
        /// The simulation's step range, inclusive upper bound (steps
        /// always start at 0).
        sim_max: i64,
    },
    /// `replicate(name)` referenced a simulation the config does not
    /// declare.
    SimulationNotFound {
        /// The requested simulation name.
        name: String,
    },
    /// A precomputed-grid or config lookup named a logical resource the
    /// active [`crate::grid_loader::InputGetterStrategy`]/
    /// [`crate::config::ConfigSource`] could not find.
    ExternalDataNotFound {
        /// The requested logical name.
        name: String,
    },
    /// A precomputed grid or config resource was found but not in a
    /// format this bridge understands.
    UnsupportedExternalFormat {
        /// The requested logical name.
        name: String,
    },
    /// A spatial query or entity-creation call reached the bridge
    /// outside of an active step (before `start_step` or after
    /// `end_step`).
    NoActiveStep,
    /// `createEntity` named a prototype the bridge has no declaration
    /// for.
    PrototypeNotFound {
        /// The requested prototype/type name.
        name: String,
    },
    /// A spatial query or `createEntity` call was issued from an entity
    /// with no resolvable grid-space location (neither its own key nor
    /// an owning patch's key).
    MissingSpatialOrigin,
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(e) => write!(f, "{e}"),
            Self::Grid(e) => write!(f, "{e}"),
            Self::PrecomputedStepOutOfRange { name, value, grid_min, grid_max, sim_max } => {
                write!(
                    f,
                    "precomputed grid '{name}' has no data at timestep {value} \
                     (grid covers steps [{grid_min}, {grid_max}], simulation runs steps [0, {sim_max}])"
                )
            }
            Self::SimulationNotFound { name } => write!(f, "simulation '{name}' not found"),
            Self::ExternalDataNotFound { name } => write!(f, "external data '{name}' not found"),
            Self::UnsupportedExternalFormat { name } => {
                write!(f, "external data '{name}' is not in a supported format")
            }
            Self::NoActiveStep => write!(f, "no step is currently active on this bridge"),
            Self::PrototypeNotFound { name } => write!(f, "prototype '{name}' not found"),
            Self::MissingSpatialOrigin => {
                write!(f, "spatial operation has no resolvable origin location")
            }
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Handler(e) => Some(e),
            Self::Grid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HandlerError> for BridgeError {
    fn from(e: HandlerError) -> Self {
        Self::Handler(e)
    }
}

impl From<GridError> for BridgeError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

/// Convert a bridge-level failure into the `HandlerError` shape a
/// [`josh_shadow::SpatialSupport`] implementation must return, so the
/// bridge's richer error detail still reaches the handler's caller as
/// readable text.
impl From<BridgeError> for HandlerError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::Handler(inner) => inner,
            other => HandlerError::ScopeError(other.to_string()),
        }
    }
}
