//! [`Entity`]: mutable attribute storage bound to a prototype.

use indexmap::IndexMap;
use josh_core::{AttributeKey, EntityId, EntityKind, GeoKey};
use josh_units::Value;
use std::sync::Arc;

use crate::frozen::FrozenEntity;
use crate::prototype::{EventHandlers, Prototype};

/// A named, keyed object carrying a mutable mapping from attribute name
/// to typed value (`spec.md` §3).
///
/// `spec.md` §4.B: "Mutation is allowed only via explicit
/// `set_attribute`; event-handler evaluation does not mutate the
/// underlying store — it writes through the shadowing layer." `Entity`
/// itself has no notion of "currently resolving"; that lives entirely in
/// `josh-shadow`.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    prototype: Arc<Prototype>,
    key: Option<GeoKey>,
    parent: Option<EntityId>,
    values: IndexMap<AttributeKey, Value>,
}

impl Entity {
    /// Construct a fresh entity with no attribute values set.
    pub fn new(prototype: Arc<Prototype>, key: Option<GeoKey>, parent: Option<EntityId>) -> Self {
        Self {
            id: EntityId::next(),
            prototype,
            key,
            parent,
            values: IndexMap::new(),
        }
    }

    /// This entity's process-unique identity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// What kind of entity this is.
    pub fn kind(&self) -> EntityKind {
        self.prototype.kind
    }

    /// The prototype this entity was built from.
    pub fn prototype(&self) -> &Arc<Prototype> {
        &self.prototype
    }

    /// The compiled handlers declared for `name`, if this entity's
    /// prototype declares any.
    pub fn handlers_for(&self, name: &AttributeKey) -> Option<&EventHandlers> {
        self.prototype.handlers_for(name)
    }

    /// This entity's parent, for `MemberSpatialEntity` (organisms).
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// `spec.md` §4.B: `get_attribute(name) -> Option<Value>`.
    pub fn get_attribute(&self, name: &AttributeKey) -> Option<&Value> {
        self.values.get(name)
    }

    /// `spec.md` §4.B: `set_attribute(name, value)`. The only legal
    /// mutation path for an entity's store.
    pub fn set_attribute(&mut self, name: AttributeKey, value: Value) {
        self.values.insert(name, value);
    }

    /// `spec.md` §4.B: `get_key() -> Option<GeoKey>`.
    pub fn get_key(&self) -> Option<&GeoKey> {
        self.key.as_ref()
    }

    /// Iterate over every attribute name this prototype declares, in
    /// declaration order — independent of which ones currently have a
    /// resolved value.
    pub fn declared_attributes(&self) -> impl Iterator<Item = &AttributeKey> {
        self.prototype.attributes.keys()
    }

    /// `spec.md` §4.B / invariant 6: produce an immutable snapshot
    /// independent of subsequent mutation.
    pub fn freeze(&self) -> FrozenEntity {
        FrozenEntity::new(
            self.id,
            self.kind(),
            self.prototype.type_name.clone(),
            self.key.clone(),
            self.parent,
            self.values.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use josh_units::Units;

    fn prototype() -> Arc<Prototype> {
        Arc::new(Prototype::new("Default", EntityKind::Patch))
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut entity = Entity::new(prototype(), None, None);
        entity.set_attribute(
            AttributeKey::new("value"),
            Value::Int(5, Units::base("m")),
        );
        assert_eq!(
            entity.get_attribute(&AttributeKey::new("value")),
            Some(&Value::Int(5, Units::base("m")))
        );
    }

    #[test]
    fn freeze_is_independent_of_later_mutation() {
        let mut entity = Entity::new(prototype(), None, None);
        entity.set_attribute(AttributeKey::new("value"), Value::Int(5, Units::empty()));
        let frozen = entity.freeze();
        entity.set_attribute(AttributeKey::new("value"), Value::Int(99, Units::empty()));
        assert_eq!(
            frozen.get_attribute(&AttributeKey::new("value")),
            Some(&Value::Int(5, Units::empty()))
        );
    }

    #[test]
    fn unset_attribute_handlers_lookup_misses() {
        let entity = Entity::new(prototype(), None, None);
        assert!(entity.handlers_for(&AttributeKey::new("value")).is_none());
    }
}
