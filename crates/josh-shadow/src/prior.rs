//! [`PriorView`]: the read-only `prior.*` synthetic scope.

use josh_core::AttributeKey;
use josh_entity::FrozenEntity;
use josh_units::Value;
use std::rc::Rc;

/// A wrapper exposing only the previous completed step's snapshot of an
/// entity (`spec.md` §4.C: "`prior` → a wrapper exposing the
/// previous-step snapshot only").
///
/// Unlike [`crate::entity_shadow::ShadowingEntity`], `PriorView` never
/// runs a handler: every lookup is a direct read of the frozen values
/// captured at the end of the previous step.
#[derive(Clone, Debug)]
pub struct PriorView {
    snapshot: Rc<FrozenEntity>,
}

impl PriorView {
    /// Wrap a frozen snapshot as a `prior` scope.
    pub fn new(snapshot: Rc<FrozenEntity>) -> Self {
        Self { snapshot }
    }

    /// Read `name` from the snapshot, or `None` if it was never
    /// resolved as of the previous step.
    pub fn get(&self, name: &AttributeKey) -> Option<Value> {
        self.snapshot.get_attribute(name).cloned()
    }
}
