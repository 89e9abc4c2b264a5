//! [`FrozenSnapshot`]: the export facade's write-unit.

use josh_entity::FrozenEntity;

/// Every frozen entity of one type, taken at one completed step —
/// the unit `ExportFacade::write` enqueues and sinks consume
/// (`spec.md` §4.I: "a fully-frozen timestep snapshot").
#[derive(Clone, Debug, PartialEq)]
pub struct FrozenSnapshot {
    step: u64,
    entity_type: String,
    entities: Vec<FrozenEntity>,
}

impl FrozenSnapshot {
    /// Build a snapshot for `entity_type` as of `step`.
    pub fn new(step: u64, entity_type: impl Into<String>, entities: Vec<FrozenEntity>) -> Self {
        Self {
            step,
            entity_type: entity_type.into(),
            entities,
        }
    }

    /// The absolute step this snapshot was taken at.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// The entity type this snapshot holds.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The frozen entities of this type as of `step`.
    pub fn entities(&self) -> &[FrozenEntity] {
        &self.entities
    }
}
