//! [`EngineBridge`]: per-replicate state the shadowing layer reaches
//! through for entity creation, spatial queries, external data, and
//! configuration (`spec.md` §4.E).

use crate::config::{ConfigSource, ConfigValue};
use crate::error::BridgeError;
use crate::grid_loader::PrecomputedGridLoader;
use crate::query_cache::{QueryCache, QueryFingerprint};
use crate::replicate::Replicate;
use indexmap::IndexMap;
use josh_core::{AttributeKey, EntityId, GeoKey};
use josh_entity::{Entity, Prototype};
use josh_handler::HandlerError;
use josh_shadow::SpatialSupport;
use josh_space::{GridAxis, GridError, PrecomputedGrid};
use josh_units::{Distribution, UnitRegistry, Units, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Per-replicate state: current patches, the prototype registry,
/// external-data getters, and spatial query execution (`spec.md` §2's
/// Engine Bridge row).
///
/// Patch and organism storage is taken out of the bridge (cloned) while
/// a worker thread processes one sub-step for that entity, and
/// committed back when the sub-step finishes — the bridge itself never
/// holds a lock for longer than one clone or one assignment, so a
/// spatial query issued mid-sub-step against a patch currently being
/// processed observes that patch's state as of the end of the previous
/// sub-step, never a half-updated value and never a deadlock.
pub struct EngineBridge {
    registry: Arc<UnitRegistry>,
    prototypes: HashMap<String, Arc<Prototype>>,
    patches: RwLock<IndexMap<GeoKey, Mutex<Entity>>>,
    organisms: RwLock<HashMap<EntityId, Mutex<Entity>>>,
    config: Box<dyn ConfigSource>,
    grid_loader: PrecomputedGridLoader,
    query_cache: QueryCache,
    replicate: Replicate,
    total_steps: u64,
    steps_completed: AtomicU64,
    serial: AtomicBool,
}

impl EngineBridge {
    /// Build a bridge over an initial patch set, ready to run
    /// `total_steps` steps of replicate `replicate_index`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<UnitRegistry>,
        prototypes: HashMap<String, Arc<Prototype>>,
        patches: IndexMap<GeoKey, Entity>,
        config: Box<dyn ConfigSource>,
        grid_loader: PrecomputedGridLoader,
        replicate_index: u64,
        retention: usize,
        total_steps: u64,
        serial: bool,
    ) -> Self {
        let patches = patches.into_iter().map(|(k, v)| (k, Mutex::new(v))).collect();
        Self {
            registry,
            prototypes,
            patches: RwLock::new(patches),
            organisms: RwLock::new(HashMap::new()),
            config,
            grid_loader,
            query_cache: QueryCache::new(),
            replicate: Replicate::new(replicate_index, retention),
            total_steps,
            steps_completed: AtomicU64::new(0),
            serial: AtomicBool::new(serial),
        }
    }

    /// The unit registry in effect for this replicate.
    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    /// Begin a step: invalidate the query cache's memoized results.
    ///
    /// `spec.md` §4.H: a new step's resolution never reuses a spatial
    /// query result computed under the previous step's entity state.
    pub fn start_step(&self) {
        self.query_cache.begin_step();
    }

    /// Complete a step: freeze every current patch, record the
    /// snapshot under this replicate, and advance the completed-step
    /// counter.
    pub fn end_step(&self) -> u64 {
        let snapshot = self
            .patches
            .read()
            .expect("patches lock poisoned")
            .values()
            .map(|cell| cell.lock().expect("patch lock poisoned").freeze())
            .collect();
        let step = self.steps_completed.fetch_add(1, Ordering::AcqRel);
        self.replicate.record_step(step, snapshot);
        step
    }

    /// Every patch's key currently materialized, in insertion order —
    /// the set the stepper partitions across workers each sub-step.
    pub fn current_patches(&self) -> Vec<GeoKey> {
        self.patches.read().expect("patches lock poisoned").keys().cloned().collect()
    }

    /// How many steps this bridge has completed so far.
    pub fn absolute_timestep(&self) -> u64 {
        self.steps_completed.load(Ordering::Acquire)
    }

    /// Whether this replicate has run every configured step.
    pub fn is_complete(&self) -> bool {
        self.absolute_timestep() >= self.total_steps
    }

    /// This bridge's replicate handle — cheap to clone, shares the
    /// retained timestep history.
    pub fn replicate(&self) -> Replicate {
        self.replicate.clone()
    }

    /// Fetch a precomputed grid by logical name, parsing and caching it
    /// on first access.
    pub fn get_precomputed(&self, name: &str) -> Result<PrecomputedGrid, BridgeError> {
        self.grid_loader.get(name, &self.registry)
    }

    /// Sample a precomputed grid at one grid cell and absolute step.
    pub fn sample_precomputed(
        &self,
        name: &str,
        location: (i64, i64),
        step: i64,
    ) -> Result<Value, BridgeError> {
        let grid = self.get_precomputed(name)?;
        grid.get_at(location, step).map_err(|e| self.annotate_step_error(name, e))
    }

    /// Widen a grid's own out-of-bounds timestep error with this
    /// bridge's simulation step range, since the two may disagree when
    /// a grid is loaded for a shorter or longer run than it covers.
    /// Spatial-axis errors pass through unchanged.
    fn annotate_step_error(&self, name: &str, error: GridError) -> BridgeError {
        match error {
            GridError::GridOutOfBounds { axis: GridAxis::Timestep, value, min, max } => {
                BridgeError::PrecomputedStepOutOfRange {
                    name: name.to_string(),
                    value,
                    grid_min: min,
                    grid_max: max,
                    sim_max: self.total_steps.saturating_sub(1) as i64,
                }
            }
            other => BridgeError::Grid(other),
        }
    }

    /// Look up a declared configuration value.
    pub fn get_config(&self, name: &str) -> Option<ConfigValue> {
        self.config.get(name)
    }

    /// Whether this bridge is currently configured to process patches
    /// one at a time rather than across worker threads.
    pub fn is_serial(&self) -> bool {
        self.serial.load(Ordering::Acquire)
    }

    /// Switch between serial and parallel patch processing.
    ///
    /// `spec.md` §4.H names this as a stepper-level toggle; it is
    /// stored on the bridge because the bridge is the object shared
    /// across worker threads, and read by the stepper before each
    /// sub-step's partitioning decision.
    pub fn set_serial(&self, serial: bool) {
        self.serial.store(serial, Ordering::Release);
    }

    /// Clone out the entity stored at `key` for a worker thread to
    /// process; does not remove it from the bridge's storage.
    pub fn take_patch(&self, key: &GeoKey) -> Option<Entity> {
        let map = self.patches.read().expect("patches lock poisoned");
        map.get(key).map(|cell| cell.lock().expect("patch lock poisoned").clone())
    }

    /// Write a processed entity back into the bridge's patch storage.
    pub fn commit_patch(&self, key: &GeoKey, entity: Entity) {
        let map = self.patches.read().expect("patches lock poisoned");
        if let Some(cell) = map.get(key) {
            *cell.lock().expect("patch lock poisoned") = entity;
        }
    }

    /// Clone out the organism stored under `id`, if any.
    pub fn take_organism(&self, id: EntityId) -> Option<Entity> {
        let map = self.organisms.read().expect("organisms lock poisoned");
        map.get(&id).map(|cell| cell.lock().expect("organism lock poisoned").clone())
    }

    /// Write a processed organism back into the bridge's storage.
    pub fn commit_organism(&self, id: EntityId, entity: Entity) {
        let map = self.organisms.read().expect("organisms lock poisoned");
        if let Some(cell) = map.get(&id) {
            *cell.lock().expect("organism lock poisoned") = entity;
        }
    }

    /// Every organism currently bound to `parent`, for a patch to
    /// iterate over while processing its own sub-step.
    pub fn organisms_of(&self, parent: EntityId) -> Vec<EntityId> {
        self.organisms
            .read()
            .expect("organisms lock poisoned")
            .iter()
            .filter_map(|(id, cell)| {
                let entity = cell.lock().expect("organism lock poisoned");
                (entity.parent() == Some(parent)).then_some(*id)
            })
            .collect()
    }

    fn origin_entity_id(&self, origin: &GeoKey) -> Option<EntityId> {
        let map = self.patches.read().expect("patches lock poisoned");
        map.get(origin).map(|cell| cell.lock().expect("patch lock poisoned").id())
    }

    fn create_entities_impl(
        &self,
        type_name: &str,
        count: i64,
        origin: Option<&GeoKey>,
    ) -> Result<Value, BridgeError> {
        let prototype = self.prototypes.get(type_name).cloned().ok_or_else(|| {
            BridgeError::PrototypeNotFound {
                name: type_name.to_string(),
            }
        })?;
        let origin = origin.ok_or(BridgeError::MissingSpatialOrigin)?;
        let parent = self.origin_entity_id(origin);
        let mut organisms = self.organisms.write().expect("organisms lock poisoned");
        for _ in 0..count.max(0) {
            let entity = match parent {
                Some(parent_id) => prototype.build_with_parent(None, parent_id),
                None => prototype.build(None),
            };
            organisms.insert(entity.id(), Mutex::new(entity));
        }
        Ok(Value::Int(count, Units::base(type_name)))
    }

    fn grid_distance(a: (i64, i64), b: (i64, i64)) -> f64 {
        let dx = (a.0 - b.0) as f64;
        let dy = (a.1 - b.1) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    fn execute_spatial_query_impl(
        &self,
        attribute: &str,
        distance: &Value,
        origin: Option<&GeoKey>,
    ) -> Result<Value, BridgeError> {
        let origin = origin.ok_or(BridgeError::MissingSpatialOrigin)?;
        let radius = distance.as_f64().unwrap_or(0.0);
        let fingerprint =
            QueryFingerprint::new(origin, attribute, radius, self.query_cache.current_version());
        let attribute_key = AttributeKey::new(attribute);
        let origin_cell = origin.cell();

        self.query_cache.get_or_compute(fingerprint, || {
            let map = self.patches.read().expect("patches lock poisoned");
            let mut values = Vec::new();
            let mut units = Units::empty();
            for (key, cell) in map.iter() {
                if Self::grid_distance(key.cell(), origin_cell) > radius {
                    continue;
                }
                let entity = cell.lock().expect("patch lock poisoned");
                if let Some(value) = entity.get_attribute(&attribute_key) {
                    if let Some(v) = value.as_f64() {
                        if values.is_empty() {
                            units = value.units().clone();
                        }
                        values.push(v);
                    }
                }
            }
            Ok(Value::Distribution(Distribution::Realized(values), units))
        })
    }
}

impl SpatialSupport for EngineBridge {
    fn create_entities(
        &self,
        type_name: &str,
        count: i64,
        origin: Option<&GeoKey>,
    ) -> Result<Value, HandlerError> {
        self.create_entities_impl(type_name, count, origin).map_err(Into::into)
    }

    fn execute_spatial_query(
        &self,
        attribute: &str,
        distance: &Value,
        origin: Option<&GeoKey>,
    ) -> Result<Value, HandlerError> {
        self.execute_spatial_query_impl(attribute, distance, origin).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigSource;
    use crate::grid_loader::{MapInputGetter, PrecomputedGridLoader};
    use josh_core::EntityKind;

    fn bridge(patches: IndexMap<GeoKey, Entity>) -> EngineBridge {
        let prototypes = HashMap::new();
        EngineBridge::new(
            Arc::new(UnitRegistry::new()),
            prototypes,
            patches,
            Box::new(MapConfigSource::new()),
            PrecomputedGridLoader::new(Box::new(MapInputGetter::new())),
            0,
            2,
            3,
            true,
        )
    }

    fn patch_with_value(key: GeoKey, value: Value) -> Entity {
        let prototype = Arc::new(Prototype::new("Default", EntityKind::Patch));
        let mut entity = Entity::new(prototype, Some(key), None);
        entity.set_attribute(AttributeKey::new("value"), value);
        entity
    }

    #[test]
    fn is_complete_only_after_total_steps() {
        let bridge = bridge(IndexMap::new());
        assert!(!bridge.is_complete());
        bridge.end_step();
        bridge.end_step();
        assert!(!bridge.is_complete());
        bridge.end_step();
        assert!(bridge.is_complete());
    }

    #[test]
    fn spatial_query_gathers_values_within_radius() {
        let mut patches = IndexMap::new();
        let near = GeoKey::for_cell("Default", (1, 0));
        let far = GeoKey::for_cell("Default", (10, 0));
        patches.insert(
            near.clone(),
            patch_with_value(near.clone(), Value::Double(2.0, Units::base("mm"))),
        );
        patches.insert(far.clone(), patch_with_value(far, Value::Double(99.0, Units::base("mm"))));
        let bridge = bridge(patches);

        let origin = GeoKey::for_cell("Default", (0, 0));
        let result = bridge
            .execute_spatial_query_impl("value", &Value::Double(5.0, Units::empty()), Some(&origin))
            .unwrap();
        match result {
            Value::Distribution(Distribution::Realized(values), _) => {
                assert_eq!(values, vec![2.0]);
            }
            _ => panic!("expected a realized distribution"),
        }
    }

    #[test]
    fn create_entities_without_origin_is_rejected() {
        let mut prototypes = HashMap::new();
        prototypes.insert(
            "Organism".to_string(),
            Arc::new(Prototype::new("Organism", EntityKind::Organism)),
        );
        let bridge = EngineBridge::new(
            Arc::new(UnitRegistry::new()),
            prototypes,
            IndexMap::new(),
            Box::new(MapConfigSource::new()),
            PrecomputedGridLoader::new(Box::new(MapInputGetter::new())),
            0,
            2,
            3,
            true,
        );
        let result = bridge.create_entities_impl("Organism", 1, None);
        assert!(matches!(result, Err(BridgeError::MissingSpatialOrigin)));
    }

    #[test]
    fn create_entities_with_unknown_prototype_is_rejected() {
        let bridge = bridge(IndexMap::new());
        let origin = GeoKey::for_cell("Default", (0, 0));
        let result = bridge.create_entities_impl("Organism", 1, Some(&origin));
        assert!(matches!(result, Err(BridgeError::PrototypeNotFound { .. })));
    }
}
