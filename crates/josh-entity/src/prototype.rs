//! [`Prototype`]: the parse-time declaration an [`crate::Entity`] is built
//! from.

use indexmap::IndexMap;
use josh_core::{AttributeKey, Event, EntityKind, GeoKey};
use josh_handler::EventHandlerAction;
use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::Entity;

/// The compiled handlers declared for one attribute, keyed by event tag.
pub type EventHandlers = HashMap<Event, Arc<EventHandlerAction>>;

/// Enumerates, for each attribute, the event handlers attached at parse
/// time (`spec.md` §4.B).
///
/// `IndexMap` preserves declaration order, which the stepper uses to walk
/// "every attribute that declares a handler" deterministically within a
/// sub-step.
#[derive(Clone, Debug)]
pub struct Prototype {
    /// The entity-type name (e.g. a patch or organism type declared in
    /// the DSL).
    pub type_name: String,
    /// What kind of entity this prototype builds.
    pub kind: EntityKind,
    /// Attribute name -> its compiled handlers, in declaration order.
    pub attributes: IndexMap<AttributeKey, EventHandlers>,
}

impl Prototype {
    /// Construct an empty prototype for a given type name and kind.
    pub fn new(type_name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            attributes: IndexMap::new(),
        }
    }

    /// Declare an attribute with its handlers.
    pub fn declare_attribute(&mut self, name: impl Into<AttributeKey>, handlers: EventHandlers) {
        self.attributes.insert(name.into(), handlers);
    }

    /// The handlers declared for `name`, if any.
    pub fn handlers_for(&self, name: &AttributeKey) -> Option<&EventHandlers> {
        self.attributes.get(name)
    }

    /// Instantiate a fresh, empty-valued entity from this prototype.
    ///
    /// `spec.md` §4.B: "`build()` instantiates a fresh mutable entity with
    /// empty attributes; `init` handlers will populate them on the first
    /// step."
    pub fn build(self: &Arc<Self>, key: Option<GeoKey>) -> Entity {
        Entity::new(self.clone(), key, None)
    }

    /// Instantiate an entity bound to a parent (organisms only).
    pub fn build_with_parent(
        self: &Arc<Self>,
        key: Option<GeoKey>,
        parent: josh_core::EntityId,
    ) -> Entity {
        Entity::new(self.clone(), key, Some(parent))
    }
}
