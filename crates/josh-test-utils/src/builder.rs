//! A fluent builder for test [`Prototype`]s and rectangular patch grids.
//!
//! Mirrors the scaffold role of the teacher's `TestWorldBuilder`: a small
//! accumulator that hides the constructor boilerplate a test would
//! otherwise repeat for every prototype it needs.

use indexmap::IndexMap;
use josh_core::{EntityKind, GeoKey, GridCoord};
use josh_entity::{Entity, EventHandlers, Prototype};
use std::sync::Arc;

/// Accumulates attribute declarations for one prototype, then builds it.
pub struct PrototypeBuilder {
    prototype: Prototype,
}

impl PrototypeBuilder {
    /// Start building a prototype of the given type name and kind.
    pub fn new(type_name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            prototype: Prototype::new(type_name, kind),
        }
    }

    /// Start building a patch prototype.
    pub fn patch(type_name: impl Into<String>) -> Self {
        Self::new(type_name, EntityKind::Patch)
    }

    /// Start building an organism prototype.
    pub fn organism(type_name: impl Into<String>) -> Self {
        Self::new(type_name, EntityKind::Organism)
    }

    /// Declare an attribute with its compiled handlers.
    pub fn with_attribute(mut self, name: impl Into<String>, handlers: EventHandlers) -> Self {
        self.prototype.declare_attribute(name.into(), handlers);
        self
    }

    /// Finish building, returning an `Arc`-wrapped prototype ready for
    /// `Prototype::build`/`build_with_parent`.
    pub fn build(self) -> Arc<Prototype> {
        Arc::new(self.prototype)
    }
}

/// Build a rectangular `width` x `height` patch set from `prototype`,
/// keyed by [`GeoKey`] in row-major order starting at `(0, 0)`.
///
/// Mirrors `MockFieldReader`/`MockFieldWriter`'s pre-populate-before-use
/// pattern: the returned map is ready to hand directly to an
/// `EngineBridge` or processed in isolation by a stepper test.
pub fn grid_fixture(
    prototype: &Arc<Prototype>,
    width: i64,
    height: i64,
) -> IndexMap<GeoKey, Entity> {
    let mut patches = IndexMap::new();
    for y in 0..height {
        for x in 0..width {
            let cell: GridCoord = (x, y);
            let key = GeoKey::for_cell(prototype.type_name.clone(), cell);
            let entity = prototype.build(Some(key.clone()));
            patches.insert(key, entity);
        }
    }
    patches
}
