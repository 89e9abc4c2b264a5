//! [`ShadowingEntity`]: per-step memoized attribute resolution plus
//! synthetic-scope access for one patch or organism.

use crate::meta::MetaHandle;
use crate::outcome::ResolveOutcome;
use crate::prior::PriorView;
use crate::support::SpatialSupport;
use indexmap::IndexMap;
use josh_core::{AttributeKey, Event, EntityId, EntityKind, GeoKey};
use josh_entity::{Entity, FrozenEntity};
use josh_handler::{HandlerError, Scope};
use josh_units::{EntityRef, UnitRegistry, Units, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// `ShadowingEntity(inner, root)` (`spec.md` §4.C): wraps a mutable
/// [`Entity`] with the per-step `resolved` cache, the `in_progress`
/// cycle sentinel, and links to the synthetic scopes (`here`, `meta`,
/// `parent`, `prior`) a compiled handler's RHS may read through.
///
/// Built and read from a single worker thread per patch, so its shared
/// state uses `Rc`/`RefCell` rather than `Arc`/`Mutex` — unlike
/// [`crate::meta::MetaShadow`], which is read from every patch's
/// thread and must be thread-safe.
pub struct ShadowingEntity {
    inner: Rc<RefCell<Entity>>,
    prior: Option<PriorView>,
    here: Option<Rc<ShadowingEntity>>,
    parent: Option<Rc<ShadowingEntity>>,
    meta: MetaHandle,
    registry: Rc<UnitRegistry>,
    support: Option<Rc<dyn SpatialSupport>>,
    event: Cell<Event>,
    resolved: RefCell<IndexMap<AttributeKey, Value>>,
    in_progress: Rc<RefCell<HashSet<AttributeKey>>>,
    locals: RefCell<HashMap<String, Value>>,
}

impl ShadowingEntity {
    /// Wrap a patch entity: `here` and `parent` both resolve to itself.
    pub fn for_patch(
        inner: Rc<RefCell<Entity>>,
        prior: Option<PriorView>,
        meta: MetaHandle,
        registry: Rc<UnitRegistry>,
        support: Option<Rc<dyn SpatialSupport>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            inner,
            prior,
            here: None,
            parent: None,
            meta,
            registry,
            support,
            event: Cell::new(Event::Init),
            resolved: RefCell::new(IndexMap::new()),
            in_progress: Rc::new(RefCell::new(HashSet::new())),
            locals: RefCell::new(HashMap::new()),
        })
    }

    /// Wrap an organism entity bound to its owning patch. Shares the
    /// patch's in-progress set so a nested `here.x`/`parent.x` read
    /// cannot re-enter an attribute the owning patch is itself already
    /// resolving (`spec.md` §4.C: "propagates the in-progress set for
    /// the enclosing resolution").
    pub fn for_organism(
        inner: Rc<RefCell<Entity>>,
        prior: Option<PriorView>,
        here: Rc<ShadowingEntity>,
        meta: MetaHandle,
        registry: Rc<UnitRegistry>,
        support: Option<Rc<dyn SpatialSupport>>,
    ) -> Rc<Self> {
        let in_progress = Rc::clone(&here.in_progress);
        Rc::new(Self {
            inner,
            prior,
            parent: Some(Rc::clone(&here)),
            here: Some(here),
            meta,
            registry,
            support,
            event: Cell::new(Event::Init),
            resolved: RefCell::new(IndexMap::new()),
            in_progress,
            locals: RefCell::new(HashMap::new()),
        })
    }

    /// This entity's identity.
    pub fn id(&self) -> EntityId {
        self.inner.borrow().id()
    }

    /// What kind of entity this shadow wraps.
    pub fn kind(&self) -> EntityKind {
        self.inner.borrow().kind()
    }

    /// This entity's grid-space key, if any.
    pub fn get_key(&self) -> Option<GeoKey> {
        self.inner.borrow().get_key().cloned()
    }

    /// The key bridge-facing spatial operations should treat as "the
    /// entity currently being evaluated"'s location: this entity's own
    /// key if it has one, otherwise its owning patch's key (organisms
    /// carry no geometry of their own).
    fn origin_key(&self) -> Option<GeoKey> {
        self.get_key().or_else(|| self.here.as_ref().and_then(|h| h.get_key()))
    }

    /// Every attribute this entity's prototype declares, in declaration
    /// order — the set the stepper forces resolution of on each
    /// sub-step regardless of whether a handler happens to read them.
    pub fn declared_attributes(&self) -> Vec<AttributeKey> {
        self.inner.borrow().declared_attributes().cloned().collect()
    }

    /// Begin a new sub-step: drop the per-event resolved cache, clear
    /// local variables, and record which event's handlers now apply.
    pub fn begin_substep(&self, event: Event) {
        self.event.set(event);
        self.resolved.borrow_mut().clear();
        self.locals.borrow_mut().clear();
    }

    /// Snapshot the underlying entity for use as next step's `prior`.
    pub fn freeze(&self) -> FrozenEntity {
        self.inner.borrow().freeze()
    }

    /// Resolve a (possibly dotted, synthetic-scope-qualified) attribute
    /// path such as `"value"`, `"prior.value"`, or `"meta.year"`.
    pub fn resolve(&self, path: &str) -> Result<Value, HandlerError> {
        self.resolve_path(path)
    }

    fn resolve_path(&self, path: &str) -> Result<Value, HandlerError> {
        if let Some((head, rest)) = path.split_once('.') {
            return match head {
                "current" => self.resolve_path(rest),
                "prior" => self.resolve_prior(rest),
                "here" => self.resolve_here(rest),
                "meta" => self.resolve_meta(rest),
                "parent" => self.resolve_parent(rest),
                _ => self.resolve_own(&AttributeKey::new(path)),
            };
        }
        match path {
            "current" => Ok(self.entity_ref()),
            "here" => Ok(match &self.here {
                Some(h) => h.entity_ref(),
                None => self.entity_ref(),
            }),
            "parent" => match &self.parent {
                Some(p) => Ok(p.entity_ref()),
                None => Err(HandlerError::ScopeError(
                    "'parent' is only available on organisms".to_string(),
                )),
            },
            "meta" => Ok(self.meta.lock().expect("meta lock poisoned").entity_ref()),
            "geoKey" => self.resolve_geokey(),
            _ => self.resolve_own(&AttributeKey::new(path)),
        }
    }

    fn resolve_prior(&self, rest: &str) -> Result<Value, HandlerError> {
        match &self.prior {
            Some(p) => p.get(&AttributeKey::new(rest)).ok_or_else(|| {
                HandlerError::ScopeError(format!("no prior value for '{rest}'"))
            }),
            None => Err(HandlerError::ScopeError(format!(
                "no prior snapshot available for '{rest}' (first step)"
            ))),
        }
    }

    fn resolve_here(&self, rest: &str) -> Result<Value, HandlerError> {
        match &self.here {
            Some(h) => h.resolve_path(rest),
            None => self.resolve_path(rest),
        }
    }

    fn resolve_parent(&self, rest: &str) -> Result<Value, HandlerError> {
        match &self.parent {
            Some(p) => p.resolve_path(rest),
            None => Err(HandlerError::ScopeError(
                "'parent' is only available on organisms".to_string(),
            )),
        }
    }

    fn resolve_meta(&self, rest: &str) -> Result<Value, HandlerError> {
        self.meta
            .lock()
            .expect("meta lock poisoned")
            .resolve(&AttributeKey::new(rest))
    }

    fn resolve_geokey(&self) -> Result<Value, HandlerError> {
        let key = AttributeKey::new("geoKey");
        if let Some(v) = self.inner.borrow().get_attribute(&key) {
            return Ok(v.clone());
        }
        match self.inner.borrow().get_key() {
            Some(geo) => Ok(Value::String(geo.to_string(), Units::empty())),
            None => Err(HandlerError::ScopeError(
                "entity has no geoKey".to_string(),
            )),
        }
    }

    fn entity_ref(&self) -> Value {
        let entity = self.inner.borrow();
        let type_name = entity.prototype().type_name.clone();
        Value::EntityRef(
            EntityRef {
                id: entity.id(),
                type_name: type_name.clone(),
            },
            Units::base(type_name),
        )
    }

    fn resolve_own(&self, name: &AttributeKey) -> Result<Value, HandlerError> {
        match self.try_resolve(name)? {
            ResolveOutcome::Resolved(v) => Ok(v),
            ResolveOutcome::Pending | ResolveOutcome::Loop => self
                .inner
                .borrow()
                .get_attribute(name)
                .cloned()
                .ok_or_else(|| {
                    HandlerError::ScopeError(format!(
                        "resolution loop on '{name}' with no prior value to fall back to"
                    ))
                }),
        }
    }

    fn try_resolve(&self, name: &AttributeKey) -> Result<ResolveOutcome, HandlerError> {
        if let Some(v) = self.resolved.borrow().get(name) {
            return Ok(ResolveOutcome::Resolved(v.clone()));
        }
        if self.in_progress.borrow().contains(name) {
            return Ok(ResolveOutcome::Loop);
        }
        self.in_progress.borrow_mut().insert(name.clone());
        let outcome = self.run_handler(name);
        self.in_progress.borrow_mut().remove(name);
        let value = outcome?;
        self.resolved.borrow_mut().insert(name.clone(), value.clone());
        self.inner.borrow_mut().set_attribute(name.clone(), value.clone());
        Ok(ResolveOutcome::Resolved(value))
    }

    fn run_handler(&self, name: &AttributeKey) -> Result<Value, HandlerError> {
        let handlers = self
            .inner
            .borrow()
            .handlers_for(name)
            .cloned()
            .ok_or_else(|| {
                HandlerError::ScopeError(format!("no handler declared for attribute '{name}'"))
            })?;
        let event = self.event.get();
        let action = event
            .fallback_chain()
            .iter()
            .find_map(|e| handlers.get(e).cloned())
            .ok_or_else(|| {
                HandlerError::ScopeError(format!(
                    "no handler for '{name}' matches event {event} or its fallbacks"
                ))
            })?;
        let mut cursor = ScopeCursor { entity: self };
        action.execute(&mut cursor)
    }
}

/// Adapter satisfying [`Scope`]'s `&mut self` methods over a shared
/// `&ShadowingEntity`, since the entity itself is commonly held as
/// `Rc<ShadowingEntity>` (shared between a patch and its organisms) and
/// so is never available as a unique `&mut` reference.
struct ScopeCursor<'a> {
    entity: &'a ShadowingEntity,
}

impl<'a> Scope for ScopeCursor<'a> {
    fn resolve_attribute(&mut self, name: &str) -> Result<Value, HandlerError> {
        self.entity.resolve_path(name)
    }

    fn create_entities(&mut self, type_name: &str, count: i64) -> Result<Value, HandlerError> {
        let origin = self.entity.origin_key();
        match &self.entity.support {
            Some(s) => s.create_entities(type_name, count, origin.as_ref()),
            None => Err(HandlerError::ScopeError(
                "entity creation is not available in this scope".to_string(),
            )),
        }
    }

    fn execute_spatial_query(
        &mut self,
        attribute: &str,
        distance: &Value,
    ) -> Result<Value, HandlerError> {
        let origin = self.entity.origin_key();
        match &self.entity.support {
            Some(s) => s.execute_spatial_query(attribute, distance, origin.as_ref()),
            None => Err(HandlerError::ScopeError(
                "spatial queries are not available in this scope".to_string(),
            )),
        }
    }

    fn unit_registry(&self) -> &UnitRegistry {
        &self.entity.registry
    }

    fn set_local(&mut self, name: &str, value: Value) {
        self.entity.locals.borrow_mut().insert(name.to_string(), value);
    }

    fn get_local(&self, name: &str) -> Option<Value> {
        self.entity.locals.borrow().get(name).cloned()
    }
}
