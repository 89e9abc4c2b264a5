//! Concrete end-to-end scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use josh::prelude::*;
use josh_bridge::config::MapConfigSource;
use josh_bridge::grid_loader::{MapInputGetter, PrecomputedGridLoader};
use josh_core::Event;
use josh_space::PrecomputedGrid;
use josh_test_utils::PrototypeBuilder;

fn bridge_for(patches: indexmap::IndexMap<GeoKey, Entity>, registry: Arc<UnitRegistry>, total_steps: u64) -> Arc<EngineBridge> {
    Arc::new(EngineBridge::new(
        registry,
        HashMap::new(),
        patches,
        Box::new(MapConfigSource::new()),
        PrecomputedGridLoader::new(Box::new(MapInputGetter::new())),
        0,
        2,
        total_steps,
        false,
    ))
}

fn meta_for(registry: &UnitRegistry) -> MetaHandle {
    let simulation = Entity::new(Arc::new(Prototype::new("S", josh_core::EntityKind::Simulation)), None, None);
    MetaShadow::new(simulation, registry.clone(), 0, 0).into_handle()
}

fn attribute_on_step(bridge: &Arc<EngineBridge>, step: u64, name: &str) -> Value {
    let snapshot = bridge.replicate().get_step(step).expect("step retained");
    let frozen = snapshot.iter().next().expect("one patch");
    frozen.get_attribute(&AttributeKey::new(name)).unwrap().clone()
}

fn as_int(value: Value) -> i64 {
    match value {
        Value::Int(n, _) => n,
        other => panic!("expected Int, got {other:?}"),
    }
}

/// S1 — single-patch constant simulation: `value.init = 5 m`,
/// `value.step = prior.value + 1 m`, three steps.
#[test]
fn s1_single_patch_constant_simulation() {
    let registry = Arc::new(UnitRegistry::new());
    let meters = registry.parse("meters");

    let mut handlers: HashMap<Event, Arc<EventHandlerAction>> = HashMap::new();
    handlers.insert(
        Event::Init,
        Arc::new(EventHandlerAction::Ops(vec![Op::Push(Value::Int(5, meters.clone()))])),
    );
    handlers.insert(
        Event::Step,
        Arc::new(EventHandlerAction::Ops(vec![
            Op::PushAttribute { name: "prior.value".to_string() },
            Op::Push(Value::Int(1, meters)),
            Op::Add,
        ])),
    );
    let prototype = PrototypeBuilder::patch("Default").with_attribute("value", handlers).build();

    let key = GeoKey::for_cell("Default", (0, 0));
    let mut patches = indexmap::IndexMap::new();
    patches.insert(key.clone(), prototype.build(Some(key)));

    let bridge = bridge_for(patches, Arc::clone(&registry), 3);
    let meta = meta_for(&registry);
    let stepper = Stepper::new(
        Arc::clone(&bridge),
        meta,
        StepperConfig { retention: 2, serial: true, worker_count: Some(1) },
    );

    for (step, expected) in [5i64, 6, 7].into_iter().enumerate() {
        let completed = stepper.perform(true).unwrap();
        assert_eq!(completed, step as u64);
        assert_eq!(as_int(attribute_on_step(&bridge, step as u64, "value")), expected);
    }
}

/// S2 — alias equivalence: declaring `year` with aliases `yeers`, `yrs`,
/// then casting `5 yeers` `as yrs` yields `5 yrs` without error.
#[test]
fn s2_alias_equivalence() {
    let mut registry = UnitRegistry::new();
    registry.register_alias_class(&["year", "yeers", "yrs"]);
    let yeers = registry.parse("yeers");
    let yrs = registry.parse("yrs");
    assert_eq!(yeers, yrs);

    let five_yeers = Value::Int(5, yeers);
    let cast = five_yeers.cast(&yrs, &registry).unwrap();
    match cast {
        Value::Int(n, units) => {
            assert_eq!(n, 5);
            assert_eq!(units, yrs);
        }
        other => panic!("expected Int, got {other:?}"),
    }
}

/// S3 — self-reference with prior fallback: `Trees.init = 10 count`,
/// `Trees.end = prior.Trees + 1 count` across three steps.
#[test]
fn s3_prior_fallback_self_reference() {
    let registry = Arc::new(UnitRegistry::new());
    let count = registry.parse("count");

    let mut handlers: HashMap<Event, Arc<EventHandlerAction>> = HashMap::new();
    handlers.insert(
        Event::Init,
        Arc::new(EventHandlerAction::Ops(vec![Op::Push(Value::Int(10, count.clone()))])),
    );
    handlers.insert(
        Event::End,
        Arc::new(EventHandlerAction::Ops(vec![
            Op::PushAttribute { name: "prior.Trees".to_string() },
            Op::Push(Value::Int(1, count)),
            Op::Add,
        ])),
    );
    let prototype = PrototypeBuilder::patch("Default").with_attribute("Trees", handlers).build();

    let key = GeoKey::for_cell("Default", (0, 0));
    let mut patches = indexmap::IndexMap::new();
    patches.insert(key.clone(), prototype.build(Some(key)));

    let bridge = bridge_for(patches, Arc::clone(&registry), 3);
    let meta = meta_for(&registry);
    let stepper = Stepper::new(
        Arc::clone(&bridge),
        meta,
        StepperConfig { retention: 2, serial: true, worker_count: Some(1) },
    );

    for (step, expected) in [10i64, 11, 12].into_iter().enumerate() {
        stepper.perform(true).unwrap();
        assert_eq!(as_int(attribute_on_step(&bridge, step as u64, "Trees")), expected);
    }
}

/// S4 — JSHD round-trip: a 3x2x4 grid survives `to_bytes`/`from_bytes`
/// and `to_base64`/`from_base64` with every cell and metadata intact.
#[test]
fn s4_jshd_round_trip() {
    let registry = UnitRegistry::new();
    let kg = registry.parse("kg");
    let mut values = vec![vec![vec![0.0; 4]; 2]; 3];
    for (t, plane) in values.iter_mut().enumerate() {
        for (y, row) in plane.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = (t * 100 + y * 10 + x) as f64;
            }
        }
    }
    let grid = PrecomputedGrid::new(0, 3, 0, 1, 0, 2, kg, values).unwrap();

    let bytes = grid.to_bytes().unwrap();
    let from_bytes = PrecomputedGrid::from_bytes(&bytes, &registry).unwrap();
    assert_eq!(grid, from_bytes);

    let encoded = grid.to_base64().unwrap();
    let from_base64 = PrecomputedGrid::from_base64(&encoded, &registry).unwrap();
    assert_eq!(grid, from_base64);
}

/// S5 — out-of-bounds timestep: a grid covering steps `[0, 5]` rejects
/// step 6 with `GridOutOfBounds`.
#[test]
fn s5_out_of_bounds_timestep() {
    let registry = UnitRegistry::new();
    let kg = registry.parse("kg");
    let values = vec![vec![vec![0.0; 1]; 1]; 6];
    let grid = PrecomputedGrid::new(0, 0, 0, 0, 0, 5, kg, values).unwrap();

    let result = grid.get_at((0, 0), 6);
    assert_eq!(
        result,
        Err(josh_space::GridError::GridOutOfBounds {
            axis: josh_space::GridAxis::Timestep,
            value: 6,
            min: 0,
            max: 5,
        })
    );
}

/// S6 — parallel vs serial equivalence: a pure `prior`/`current`-only
/// program produces identical exported values whether run serially or
/// across worker threads.
#[test]
fn s6_parallel_vs_serial_equivalence() {
    let registry = Arc::new(UnitRegistry::new());
    let count = registry.parse("count");

    let mut handlers: HashMap<Event, Arc<EventHandlerAction>> = HashMap::new();
    handlers.insert(
        Event::Init,
        Arc::new(EventHandlerAction::Ops(vec![Op::Push(Value::Int(0, count.clone()))])),
    );
    handlers.insert(
        Event::Step,
        Arc::new(EventHandlerAction::Ops(vec![
            Op::PushAttribute { name: "prior.value".to_string() },
            Op::Push(Value::Int(1, count)),
            Op::Add,
        ])),
    );
    let prototype = PrototypeBuilder::patch("Default").with_attribute("value", handlers).build();

    let mut serial_patches = indexmap::IndexMap::new();
    let mut parallel_patches = indexmap::IndexMap::new();
    for x in 0..4 {
        let key = GeoKey::for_cell("Default", (x, 0));
        serial_patches.insert(key.clone(), prototype.build(Some(key.clone())));
        parallel_patches.insert(key.clone(), prototype.build(Some(key)));
    }

    let serial_bridge = bridge_for(serial_patches, Arc::clone(&registry), 4);
    let serial_stepper = Stepper::new(
        Arc::clone(&serial_bridge),
        meta_for(&registry),
        StepperConfig { retention: 2, serial: true, worker_count: Some(1) },
    );
    serial_stepper.run_to_completion(true).unwrap();

    let parallel_bridge = bridge_for(parallel_patches, Arc::clone(&registry), 4);
    let parallel_stepper = Stepper::new(
        Arc::clone(&parallel_bridge),
        meta_for(&registry),
        StepperConfig { retention: 2, serial: false, worker_count: Some(4) },
    );
    parallel_stepper.run_to_completion(false).unwrap();

    for step in 0..4u64 {
        let serial_snapshot = serial_bridge.replicate().get_step(step).unwrap();
        let parallel_snapshot = parallel_bridge.replicate().get_step(step).unwrap();
        let serial_values: Vec<Value> = serial_snapshot
            .iter()
            .map(|e| e.get_attribute(&AttributeKey::new("value")).unwrap().clone())
            .collect();
        let parallel_values: Vec<Value> = parallel_snapshot
            .iter()
            .map(|e| e.get_attribute(&AttributeKey::new("value")).unwrap().clone())
            .collect();
        assert_eq!(serial_values, parallel_values);
    }
}
