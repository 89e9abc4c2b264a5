//! [`JoshError`]: the top-level error a `josh` caller sees, unifying the
//! step loop, the engine bridge, and the export facade.

use josh_bridge::BridgeError;
use josh_engine::StepError;
use josh_export::ExportError;
use std::error::Error;
use std::fmt;

/// Any failure a complete simulation run can surface.
///
/// `spec.md` §7 assigns each failure mode to the layer that detects it;
/// this enum is the facade-level union a caller driving a full run
/// actually needs to match on, without reaching into every sub-crate's
/// own error type directly.
#[derive(Debug)]
pub enum JoshError {
    /// An attribute failed to resolve during a sub-step; already carries
    /// `(patch_key, attribute, event)` context.
    Step(StepError),
    /// The engine bridge, query cache, configuration lookup, or
    /// precomputed-grid loader failed outside of attribute resolution
    /// (e.g. while attaching a replicate or loading a grid).
    Bridge(BridgeError),
    /// A sink or the export facade failed.
    Export(ExportError),
}

impl fmt::Display for JoshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(e) => write!(f, "{e}"),
            Self::Bridge(e) => write!(f, "{e}"),
            Self::Export(e) => write!(f, "{e}"),
        }
    }
}

impl Error for JoshError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Step(e) => Some(e),
            Self::Bridge(e) => Some(e),
            Self::Export(e) => Some(e),
        }
    }
}

impl From<StepError> for JoshError {
    fn from(e: StepError) -> Self {
        Self::Step(e)
    }
}

impl From<BridgeError> for JoshError {
    fn from(e: BridgeError) -> Self {
        Self::Bridge(e)
    }
}

impl From<ExportError> for JoshError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}
