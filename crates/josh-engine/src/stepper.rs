//! [`Stepper`]: the sub-step loop over one bridge's current patch set.

use crate::config::StepperConfig;
use crate::error::StepError;
use crate::metrics::StepMetrics;
use josh_bridge::EngineBridge;
use josh_core::{AttributeKey, EntityId, Event, GeoKey};
use josh_entity::FrozenEntity;
use josh_handler::HandlerError;
use josh_shadow::{MetaHandle, PriorView, ShadowingEntity, SpatialSupport};
use josh_units::{UnitRegistry, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Delegates [`SpatialSupport`] to a shared bridge.
///
/// `EngineBridge` already implements `SpatialSupport` directly, but
/// `josh-shadow` holds support objects as `Rc<dyn SpatialSupport>` (its
/// resolution state is thread-local) while the bridge is shared as
/// `Arc<EngineBridge>` across worker threads — neither trait nor `Arc`
/// is local to this crate, so `impl SpatialSupport for Arc<EngineBridge>`
/// would violate the orphan rule. This newtype is built fresh inside
/// each worker thread's closure instead.
struct BridgeHandle(Arc<EngineBridge>);

impl SpatialSupport for BridgeHandle {
    fn create_entities(&self, type_name: &str, count: i64, origin: Option<&GeoKey>) -> Result<Value, HandlerError> {
        self.0.create_entities(type_name, count, origin)
    }

    fn execute_spatial_query(
        &self,
        attribute: &str,
        distance: &Value,
        origin: Option<&GeoKey>,
    ) -> Result<Value, HandlerError> {
        self.0.execute_spatial_query(attribute, distance, origin)
    }
}

/// Runs the sub-step loop described in `spec.md` §4.H over one bridge's
/// current patch set: `init` once on the first step, then `start`,
/// `step`, `end` every step, with patch processing partitioned across
/// worker threads (or run in iteration order when `serial`).
pub struct Stepper {
    bridge: Arc<EngineBridge>,
    meta: MetaHandle,
    config: StepperConfig,
    callbacks: Mutex<Vec<Box<dyn FnMut(u64) + Send>>>,
    metrics: Mutex<StepMetrics>,
}

impl Stepper {
    /// Build a stepper over `bridge`'s current patch set, sharing the
    /// simulation entity's `meta` scope across every worker thread.
    pub fn new(bridge: Arc<EngineBridge>, meta: MetaHandle, config: StepperConfig) -> Self {
        Self {
            bridge,
            meta,
            config,
            callbacks: Mutex::new(Vec::new()),
            metrics: Mutex::new(StepMetrics::default()),
        }
    }

    /// Register a callback invoked with the completed step index after
    /// each timestep, before the next begins (`spec.md` §6).
    pub fn on_step<F: FnMut(u64) + Send + 'static>(&self, callback: F) {
        self.callbacks
            .lock()
            .expect("stepper callbacks lock poisoned")
            .push(Box::new(callback));
    }

    /// Resolution counts accumulated so far across every `perform` call.
    pub fn metrics(&self) -> StepMetrics {
        *self.metrics.lock().expect("stepper metrics lock poisoned")
    }

    /// The bridge this stepper runs over, for reading back retained
    /// steps via [`EngineBridge::replicate`] after a call to `perform`.
    pub fn bridge(&self) -> &Arc<EngineBridge> {
        &self.bridge
    }

    /// Run one timestep. The first step runs only `init`; every
    /// subsequent step runs `start`, `step`, `end`, in order, with a
    /// barrier between each sub-step. Returns the just-completed
    /// absolute step index.
    pub fn perform(&self, serial: bool) -> Result<u64, StepError> {
        self.bridge.set_serial(serial);
        let step = self.bridge.absolute_timestep();
        let prior_index = self.prior_index(step);

        self.meta
            .lock()
            .expect("meta lock poisoned")
            .set_step_count(step);
        self.bridge.start_step();

        if step == 0 {
            self.meta
                .lock()
                .expect("meta lock poisoned")
                .begin_substep(Event::Init);
            let resolved = self.run_substep(Event::Init, &prior_index)?;
            self.metrics
                .lock()
                .expect("stepper metrics lock poisoned")
                .add_resolutions(resolved);
        } else {
            for event in Event::ORDER {
                self.meta
                    .lock()
                    .expect("meta lock poisoned")
                    .begin_substep(event);
                let resolved = self.run_substep(event, &prior_index)?;
                self.metrics
                    .lock()
                    .expect("stepper metrics lock poisoned")
                    .add_resolutions(resolved);
            }
        }

        let completed = self.bridge.end_step();
        self.metrics
            .lock()
            .expect("stepper metrics lock poisoned")
            .record_step();

        for callback in self
            .callbacks
            .lock()
            .expect("stepper callbacks lock poisoned")
            .iter_mut()
        {
            callback(completed);
        }

        Ok(completed)
    }

    /// Run `perform` repeatedly until the bridge's configured step
    /// count is exhausted.
    pub fn run_to_completion(&self, serial: bool) -> Result<StepMetrics, StepError> {
        while !self.bridge.is_complete() {
            self.perform(serial)?;
        }
        Ok(self.metrics())
    }

    /// Index the previous completed step's frozen patches by entity id,
    /// for `prior.*` resolution. Empty on the first step, and empty if
    /// the previous step has already fallen outside the retention
    /// window (it never should, since the stepper only ever looks one
    /// step back).
    fn prior_index(&self, step: u64) -> Arc<HashMap<EntityId, FrozenEntity>> {
        if step == 0 {
            return Arc::new(HashMap::new());
        }
        let snapshot = self.bridge.replicate().get_step(step - 1);
        let map = match snapshot {
            Some(entities) => entities.iter().map(|e| (e.id(), e.clone())).collect(),
            None => HashMap::new(),
        };
        Arc::new(map)
    }

    fn run_substep(
        &self,
        event: Event,
        prior_index: &Arc<HashMap<EntityId, FrozenEntity>>,
    ) -> Result<u64, StepError> {
        let patch_keys = self.bridge.current_patches();
        let worker_count = if self.bridge.is_serial() {
            1
        } else {
            self.config.resolve_worker_count(patch_keys.len())
        };
        let chunks = chunk_contiguous(&patch_keys, worker_count);

        let resolutions = AtomicU64::new(0);
        let failure: Mutex<Option<StepError>> = Mutex::new(None);

        std::thread::scope(|scope| {
            for chunk in chunks {
                let bridge = Arc::clone(&self.bridge);
                let meta = Arc::clone(&self.meta);
                let prior_index = Arc::clone(prior_index);
                let resolutions = &resolutions;
                let failure = &failure;
                scope.spawn(move || {
                    let registry = Rc::new(bridge.registry().as_ref().clone());
                    let support: Rc<dyn SpatialSupport> = Rc::new(BridgeHandle(Arc::clone(&bridge)));
                    for key in &chunk {
                        if failure.lock().expect("stepper failure lock poisoned").is_some() {
                            return;
                        }
                        match process_patch(&bridge, &meta, &registry, &support, key, event, &prior_index) {
                            Ok(count) => {
                                resolutions.fetch_add(count, Ordering::Relaxed);
                            }
                            Err(err) => {
                                *failure.lock().expect("stepper failure lock poisoned") = Some(err);
                                return;
                            }
                        }
                    }
                });
            }
        });

        if let Some(err) = failure.into_inner().expect("stepper failure lock poisoned") {
            return Err(err);
        }
        Ok(resolutions.load(Ordering::Relaxed))
    }
}

/// Split `keys` into `worker_count` contiguous, roughly-even chunks —
/// a static partition recomputed once per sub-step, per `spec.md` §5's
/// "patch storage during a sub-step is partitioned by patch identity".
fn chunk_contiguous(keys: &[GeoKey], worker_count: usize) -> Vec<Vec<GeoKey>> {
    if keys.is_empty() {
        return Vec::new();
    }
    let worker_count = worker_count.clamp(1, keys.len());
    let base = keys.len() / worker_count;
    let extra = keys.len() % worker_count;
    let mut chunks = Vec::with_capacity(worker_count);
    let mut start = 0;
    for i in 0..worker_count {
        let size = base + usize::from(i < extra);
        chunks.push(keys[start..start + size].to_vec());
        start += size;
    }
    chunks
}

#[allow(clippy::too_many_arguments)]
fn process_patch(
    bridge: &Arc<EngineBridge>,
    meta: &MetaHandle,
    registry: &Rc<UnitRegistry>,
    support: &Rc<dyn SpatialSupport>,
    key: &GeoKey,
    event: Event,
    prior_index: &HashMap<EntityId, FrozenEntity>,
) -> Result<u64, StepError> {
    let Some(entity) = bridge.take_patch(key) else {
        return Ok(0);
    };
    let patch_id = entity.id();
    let prior = prior_index
        .get(&patch_id)
        .cloned()
        .map(|snapshot| PriorView::new(Rc::new(snapshot)));
    let cell = Rc::new(RefCell::new(entity));
    let shadow = ShadowingEntity::for_patch(
        Rc::clone(&cell),
        prior,
        Arc::clone(meta),
        Rc::clone(registry),
        Some(Rc::clone(support)),
    );
    shadow.begin_substep(event);

    let mut count = 0u64;
    for attribute in shadow.declared_attributes() {
        resolve_or_wrap(&shadow, &attribute, Some(key), event)?;
        count += 1;
    }

    for organism_id in bridge.organisms_of(patch_id) {
        count += process_organism(bridge, meta, registry, support, &shadow, organism_id, event)?;
    }

    bridge.commit_patch(key, cell.borrow().clone());
    Ok(count)
}

#[allow(clippy::too_many_arguments)]
fn process_organism(
    bridge: &Arc<EngineBridge>,
    meta: &MetaHandle,
    registry: &Rc<UnitRegistry>,
    support: &Rc<dyn SpatialSupport>,
    here: &Rc<ShadowingEntity>,
    organism_id: EntityId,
    event: Event,
) -> Result<u64, StepError> {
    let Some(entity) = bridge.take_organism(organism_id) else {
        return Ok(0);
    };
    let cell = Rc::new(RefCell::new(entity));
    let shadow = ShadowingEntity::for_organism(
        Rc::clone(&cell),
        None,
        Rc::clone(here),
        Arc::clone(meta),
        Rc::clone(registry),
        Some(Rc::clone(support)),
    );
    shadow.begin_substep(event);

    let mut count = 0u64;
    for attribute in shadow.declared_attributes() {
        resolve_or_wrap(&shadow, &attribute, None, event)?;
        count += 1;
    }

    bridge.commit_organism(organism_id, cell.borrow().clone());
    Ok(count)
}

fn resolve_or_wrap(
    shadow: &ShadowingEntity,
    attribute: &AttributeKey,
    patch_key: Option<&GeoKey>,
    event: Event,
) -> Result<(), StepError> {
    shadow.resolve(attribute.as_str()).map(|_| ()).map_err(|source| StepError {
        patch_key: patch_key.map(ToString::to_string),
        attribute: attribute.clone(),
        event,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use josh_bridge::config::MapConfigSource;
    use josh_bridge::grid_loader::{MapInputGetter, PrecomputedGridLoader};
    use josh_core::EntityKind;
    use josh_entity::{Entity, Prototype};
    use josh_handler::{EventHandlerAction, Op};
    use josh_shadow::MetaShadow;
    use josh_units::Units;
    use indexmap::IndexMap;
    use std::collections::HashMap as StdHashMap;

    fn patch_prototype() -> Arc<Prototype> {
        let mut prototype = Prototype::new("Cell", EntityKind::Patch);
        let mut handlers = StdHashMap::new();
        handlers.insert(
            Event::Init,
            Arc::new(EventHandlerAction::Ops(vec![Op::Push(Value::Int(0, Units::empty()))])),
        );
        handlers.insert(
            Event::Start,
            Arc::new(EventHandlerAction::Ops(vec![Op::Push(Value::Int(7, Units::empty()))])),
        );
        prototype.declare_attribute("value", handlers);
        Arc::new(prototype)
    }

    fn stepper(patches: IndexMap<GeoKey, Entity>, worker_count: Option<usize>) -> Stepper {
        let bridge = Arc::new(EngineBridge::new(
            Arc::new(UnitRegistry::new()),
            StdHashMap::new(),
            patches,
            Box::new(MapConfigSource::new()),
            PrecomputedGridLoader::new(Box::new(MapInputGetter::new())),
            0,
            2,
            3,
            false,
        ));
        let simulation = Entity::new(Arc::new(Prototype::new("Simulation", EntityKind::Simulation)), None, None);
        let meta = MetaShadow::new(simulation, UnitRegistry::new(), 0, 0).into_handle();
        let config = StepperConfig {
            retention: 2,
            serial: false,
            worker_count,
        };
        Stepper::new(bridge, meta, config)
    }

    #[test]
    fn perform_resolves_start_handler_and_returns_step_index() {
        let prototype = patch_prototype();
        let key = GeoKey::for_cell("Cell", (0, 0));
        let mut patches = IndexMap::new();
        patches.insert(key.clone(), Entity::new(prototype, Some(key.clone()), None));

        let stepper = stepper(patches, Some(1));
        // Step 0 runs only `init`.
        let first = stepper.perform(true).unwrap();
        assert_eq!(first, 0);
        // Step 1 is the first to run `start`/`step`/`end`.
        let second = stepper.perform(true).unwrap();
        assert_eq!(second, 1);
        assert_eq!(stepper.metrics().steps_completed, 2);
    }

    #[test]
    fn on_step_callback_fires_with_completed_index() {
        let prototype = patch_prototype();
        let key = GeoKey::for_cell("Cell", (0, 0));
        let mut patches = IndexMap::new();
        patches.insert(key.clone(), Entity::new(prototype, Some(key), None));

        let stepper = stepper(patches, Some(1));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        stepper.on_step(move |step| seen_clone.lock().unwrap().push(step));
        stepper.perform(false).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn run_to_completion_runs_every_configured_step() {
        let prototype = patch_prototype();
        let key = GeoKey::for_cell("Cell", (0, 0));
        let mut patches = IndexMap::new();
        patches.insert(key.clone(), Entity::new(prototype, Some(key), None));

        let stepper = stepper(patches, Some(1));
        let metrics = stepper.run_to_completion(true).unwrap();
        assert_eq!(metrics.steps_completed, 3);
    }

    #[test]
    fn serial_and_parallel_runs_agree_on_final_attribute_value() {
        let key_a = GeoKey::for_cell("Cell", (0, 0));
        let key_b = GeoKey::for_cell("Cell", (1, 0));
        let mut serial_patches = IndexMap::new();
        serial_patches.insert(key_a.clone(), Entity::new(patch_prototype(), Some(key_a.clone()), None));
        serial_patches.insert(key_b.clone(), Entity::new(patch_prototype(), Some(key_b.clone()), None));
        let serial_stepper = stepper(serial_patches, Some(1));
        serial_stepper.run_to_completion(true).unwrap();

        let mut parallel_patches = IndexMap::new();
        parallel_patches.insert(key_a.clone(), Entity::new(patch_prototype(), Some(key_a), None));
        parallel_patches.insert(key_b.clone(), Entity::new(patch_prototype(), Some(key_b), None));
        let parallel_stepper = stepper(parallel_patches, Some(4));
        parallel_stepper.run_to_completion(false).unwrap();

        assert_eq!(
            serial_stepper.metrics().attribute_resolutions,
            parallel_stepper.metrics().attribute_resolutions
        );
    }
}
