//! The [`Scope`] trait a compiled handler executes against.
//!
//! `spec.md` §4.D lists ops (`pushAttribute`, `createEntity`,
//! `executeSpatialQuery`) that reach outside the pure stack machine into
//! whatever is resolving attributes for the entity currently being
//! evaluated. The handler crate only depends on this trait, not on the
//! shadowing layer or the bridge that implement it — matching how
//! `murk-propagator::StepContext` reaches field data through
//! `&dyn FieldReader` rather than a concrete arena type.

use crate::error::HandlerError;
use josh_units::{UnitRegistry, Value};

/// Everything a compiled handler's RHS may call out to during execution.
pub trait Scope {
    /// Resolve another attribute by name, through whatever synthetic-scope
    /// or memoization rules the caller implements (`spec.md` §4.C).
    fn resolve_attribute(&mut self, name: &str) -> Result<Value, HandlerError>;

    /// Create `count` new entities of the named prototype, returning a
    /// value describing what was created (typically a distribution of
    /// entity references).
    fn create_entities(&mut self, type_name: &str, count: i64) -> Result<Value, HandlerError>;

    /// Execute a spatial query for `attribute` within `distance` of the
    /// entity currently being evaluated.
    fn execute_spatial_query(
        &mut self,
        attribute: &str,
        distance: &Value,
    ) -> Result<Value, HandlerError>;

    /// The unit registry in effect for this scope, needed for
    /// alias-aware comparisons and casts.
    fn unit_registry(&self) -> &UnitRegistry;

    /// Store a named local variable for the remainder of this handler's
    /// evaluation (`saveLocalVariable`).
    fn set_local(&mut self, name: &str, value: Value);

    /// Read back a named local variable.
    fn get_local(&self, name: &str) -> Option<Value>;
}
