//! Errors surfaced by the step loop.

use josh_core::{AttributeKey, Event};
use josh_handler::HandlerError;
use std::error::Error;
use std::fmt;

/// An attribute-resolution failure, wrapped with the context the step
/// loop alone can supply.
///
/// `spec.md` §7's propagation policy: "resolution errors escape only to
/// the step loop, which wraps them with the `(patch_key, attribute,
/// event)` context and aborts the replicate."
#[derive(Clone, Debug, PartialEq)]
pub struct StepError {
    /// The entity's grid-space key, if it has one (organisms may not).
    pub patch_key: Option<String>,
    /// The attribute whose resolution failed.
    pub attribute: AttributeKey,
    /// The sub-step event being applied when it failed.
    pub event: Event,
    /// The underlying handler failure.
    pub source: HandlerError,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.patch_key {
            Some(key) => write!(
                f,
                "resolving '{}' on {key} during '{}': {}",
                self.attribute, self.event, self.source
            ),
            None => write!(
                f,
                "resolving '{}' during '{}': {}",
                self.attribute, self.event, self.source
            ),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}
