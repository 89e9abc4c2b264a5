//! [`MetaShadow`]: the thread-shared `meta` synthetic scope.

use crate::outcome::ResolveOutcome;
use josh_core::{AttributeKey, Event};
use josh_entity::Entity;
use josh_handler::{HandlerError, Scope};
use josh_units::{UnitRegistry, Units, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Thread-safe handle to the singleton simulation entity's scope,
/// reachable as `meta` from every patch and organism.
///
/// Patches resolve `meta.*` from separate worker threads during a
/// parallel step, so this cannot use the `Rc<RefCell<_>>` patch/organism
/// state does ([`crate::entity_shadow::ShadowingEntity`]) — it is
/// guarded by a `Mutex` instead, the same "per-step lock" role
/// `spec.md` §4.H assigns to other cross-patch shared state. A
/// consequence: `meta`'s cycle sentinel is independent of any patch's
/// in-progress set — a `meta.x` handler that recurses into `meta.y` is
/// caught here, but a patch handler entering `meta.x` does not extend
/// its own in-progress set into this lock.
pub struct MetaShadow {
    entity: Entity,
    registry: UnitRegistry,
    resolved: HashMap<AttributeKey, Value>,
    in_progress: HashSet<AttributeKey>,
    event: Event,
    steps_low: i64,
    step_count: u64,
}

/// A `MetaShadow` shared across every patch-processing worker thread.
pub type MetaHandle = Arc<Mutex<MetaShadow>>;

impl MetaShadow {
    /// Build a fresh meta scope around the simulation entity.
    ///
    /// `steps_low` is the simulation's `steps.low` meta attribute,
    /// resolved once at step 0 (`spec.md` §4.H); `step_count` is the
    /// current absolute timestep, advanced via [`Self::set_step_count`].
    pub fn new(entity: Entity, registry: UnitRegistry, steps_low: i64, step_count: u64) -> Self {
        Self {
            entity,
            registry,
            resolved: HashMap::new(),
            in_progress: HashSet::new(),
            event: Event::Init,
            steps_low,
            step_count,
        }
    }

    /// Wrap a fresh `MetaShadow` for sharing across worker threads.
    pub fn into_handle(self) -> MetaHandle {
        Arc::new(Mutex::new(self))
    }

    /// Begin a new sub-step: drop the per-event resolved cache and set
    /// which event's handlers (and fallbacks) now apply.
    pub fn begin_substep(&mut self, event: Event) {
        self.resolved.clear();
        self.event = event;
    }

    /// Advance the absolute timestep the synthesized `year`/`stepCount`/
    /// `step` attributes read from.
    pub fn set_step_count(&mut self, step_count: u64) {
        self.step_count = step_count;
    }

    /// The simulation entity's identity and type name, for bare `meta`
    /// references that resolve to an entity value rather than an
    /// attribute.
    pub fn entity_ref(&self) -> Value {
        let type_name = self.entity.prototype().type_name.clone();
        let id = self.entity.id();
        Value::EntityRef(
            josh_units::EntityRef { id, type_name: type_name.clone() },
            Units::base(type_name),
        )
    }

    fn synthesized(&self, name: &AttributeKey) -> Option<Value> {
        match name.as_str() {
            "year" | "stepCount" | "step" => {
                Some(Value::Int(self.steps_low + self.step_count as i64, Units::empty()))
            }
            _ => None,
        }
    }

    /// Resolve `name` against the simulation entity. Explicit handlers
    /// win over the synthesized `year`/`stepCount`/`step` defaults
    /// (`spec.md` §4.C).
    pub fn resolve(&mut self, name: &AttributeKey) -> Result<Value, HandlerError> {
        match self.try_resolve(name)? {
            ResolveOutcome::Resolved(v) => Ok(v),
            ResolveOutcome::Pending | ResolveOutcome::Loop => self
                .entity
                .get_attribute(name)
                .cloned()
                .ok_or_else(|| {
                    HandlerError::ScopeError(format!(
                        "resolution loop on meta.{name} with no prior value to fall back to"
                    ))
                }),
        }
    }

    fn try_resolve(&mut self, name: &AttributeKey) -> Result<ResolveOutcome, HandlerError> {
        if let Some(v) = self.resolved.get(name) {
            return Ok(ResolveOutcome::Resolved(v.clone()));
        }
        if self.entity.handlers_for(name).is_none() {
            if let Some(v) = self.synthesized(name) {
                self.resolved.insert(name.clone(), v.clone());
                return Ok(ResolveOutcome::Resolved(v));
            }
        }
        if self.in_progress.contains(name) {
            return Ok(ResolveOutcome::Loop);
        }
        self.in_progress.insert(name.clone());
        let outcome = self.run_handler(name);
        self.in_progress.remove(name);
        let value = outcome?;
        self.resolved.insert(name.clone(), value.clone());
        self.entity.set_attribute(name.clone(), value.clone());
        Ok(ResolveOutcome::Resolved(value))
    }

    fn run_handler(&mut self, name: &AttributeKey) -> Result<Value, HandlerError> {
        let handlers = self.entity.handlers_for(name).cloned().ok_or_else(|| {
            HandlerError::ScopeError(format!("no handler declared for meta.{name}"))
        })?;
        let event = self.event;
        let action = event
            .fallback_chain()
            .iter()
            .find_map(|e| handlers.get(e).cloned())
            .ok_or_else(|| {
                HandlerError::ScopeError(format!(
                    "no handler for meta.{name} matches event {event} or its fallbacks"
                ))
            })?;
        action.execute(self)
    }
}

impl Scope for MetaShadow {
    fn resolve_attribute(&mut self, name: &str) -> Result<Value, HandlerError> {
        self.resolve(&AttributeKey::new(name))
    }

    fn create_entities(&mut self, _type_name: &str, _count: i64) -> Result<Value, HandlerError> {
        Err(HandlerError::ScopeError(
            "entity creation is not available from a meta handler".to_string(),
        ))
    }

    fn execute_spatial_query(
        &mut self,
        _attribute: &str,
        _distance: &Value,
    ) -> Result<Value, HandlerError> {
        Err(HandlerError::ScopeError(
            "spatial queries are not available from a meta handler".to_string(),
        ))
    }

    fn unit_registry(&self) -> &UnitRegistry {
        &self.registry
    }

    fn set_local(&mut self, _name: &str, _value: Value) {}

    fn get_local(&self, _name: &str) -> Option<Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use josh_core::EntityKind;
    use josh_entity::Prototype;
    use std::sync::Arc as StdArc;

    fn meta(steps_low: i64, step_count: u64) -> MetaShadow {
        let prototype = StdArc::new(Prototype::new("Simulation", EntityKind::Simulation));
        let entity = Entity::new(prototype, None, None);
        MetaShadow::new(entity, UnitRegistry::new(), steps_low, step_count)
    }

    #[test]
    fn year_synthesizes_from_steps_low_and_step_count() {
        let mut m = meta(2000, 5);
        let v = m.resolve(&AttributeKey::new("year")).unwrap();
        assert_eq!(v, Value::Int(2005, Units::empty()));
    }

    #[test]
    fn step_count_advances_between_steps() {
        let mut m = meta(0, 0);
        assert_eq!(
            m.resolve(&AttributeKey::new("stepCount")).unwrap(),
            Value::Int(0, Units::empty())
        );
        m.begin_substep(Event::Start);
        m.set_step_count(3);
        assert_eq!(
            m.resolve(&AttributeKey::new("stepCount")).unwrap(),
            Value::Int(3, Units::empty())
        );
    }

    #[test]
    fn missing_handler_for_custom_attribute_errors() {
        let mut m = meta(0, 0);
        assert!(m.resolve(&AttributeKey::new("fireThreshold")).is_err());
    }
}
