//! [`FrozenEntity`]: an immutable snapshot of an entity's attribute
//! values.

use indexmap::IndexMap;
use josh_core::{AttributeKey, EntityId, EntityKind, GeoKey};
use josh_units::Value;

/// An immutable snapshot produced by [`crate::Entity::freeze`].
///
/// `spec.md` invariant 6: "`freeze(entity)` produces an immutable
/// snapshot whose attribute values are independent of subsequent
/// mutation." Used both as the `prior` source for the next step's
/// shadowing layer and as the export facade's write-unit.
#[derive(Clone, Debug, PartialEq)]
pub struct FrozenEntity {
    id: EntityId,
    kind: EntityKind,
    type_name: String,
    key: Option<GeoKey>,
    parent: Option<EntityId>,
    values: IndexMap<AttributeKey, Value>,
}

impl FrozenEntity {
    pub(crate) fn new(
        id: EntityId,
        kind: EntityKind,
        type_name: String,
        key: Option<GeoKey>,
        parent: Option<EntityId>,
        values: IndexMap<AttributeKey, Value>,
    ) -> Self {
        Self {
            id,
            kind,
            type_name,
            key,
            parent,
            values,
        }
    }

    /// This entity's identity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// What kind of entity this snapshot was taken from.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// The prototype/type name this entity was built from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The entity's geographic key, if any.
    pub fn get_key(&self) -> Option<&GeoKey> {
        self.key.as_ref()
    }

    /// The entity's parent, for organisms.
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Read an attribute's value as of the moment this snapshot was
    /// taken.
    pub fn get_attribute(&self, name: &AttributeKey) -> Option<&Value> {
        self.values.get(name)
    }

    /// Iterate over every resolved attribute in this snapshot.
    pub fn attributes(&self) -> impl Iterator<Item = (&AttributeKey, &Value)> {
        self.values.iter()
    }
}
