//! Josh: a spatially-explicit agent-based ecological simulation engine.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Josh sub-crates. For most users, adding `josh` as a single
//! dependency is sufficient.
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! [`prelude`]:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`core`] | `josh-core` | `Event`, `GeoKey`, entity/attribute identity |
//! | [`units`] | `josh-units` | `Units`, `UnitRegistry`, `Value`, `Distribution` |
//! | [`entity`] | `josh-entity` | `Entity`, `FrozenEntity`, `Prototype` |
//! | [`handler`] | `josh-handler` | `Scope`, `EventHandlerMachine`, `Op` |
//! | [`shadow`] | `josh-shadow` | `ShadowingEntity`, `MetaShadow`, `PriorView` |
//! | [`space`] | `josh-space` | `PatchGrid`, `PrecomputedGrid`, projection |
//! | [`bridge`] | `josh-bridge` | `EngineBridge`, `Replicate`, `QueryCache` |
//! | [`engine`] | `josh-engine` | `Stepper`, `StepperConfig`, `StepMetrics` |
//! | [`export`] | `josh-export` | `ExportFacade`, `ExportSink`, `FrozenSnapshot` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;

/// Core identity and addressing types (`josh-core`).
pub use josh_core as core;

/// Units and the typed value algebra (`josh-units`).
pub use josh_units as units;

/// Entity model: mutable store, frozen snapshot, prototype (`josh-entity`).
pub use josh_entity as entity;

/// Compiled handler execution (`josh-handler`).
pub use josh_handler as handler;

/// Shadowing attribute resolution (`josh-shadow`).
pub use josh_shadow as shadow;

/// Grid-space geometry and the precomputed grid layer (`josh-space`).
pub use josh_space as space;

/// The engine bridge: per-replicate storage and the spatial-query cache
/// (`josh-bridge`).
pub use josh_bridge as bridge;

/// The sub-step stepper and step loop (`josh-engine`).
pub use josh_engine as engine;

/// The export facade (`josh-export`).
pub use josh_export as export;

pub use error::JoshError;

/// Common imports for typical Josh usage.
///
/// ```rust
/// use josh::prelude::*;
/// ```
pub mod prelude {
    // Core identity
    pub use josh_core::{AttributeKey, Event, GeoKey, Geometry, GridCoord};

    // Units and values
    pub use josh_units::{Distribution, UnitRegistry, Units, Value};

    // Entity model
    pub use josh_entity::{Entity, EventHandlers, FrozenEntity, Prototype};

    // Handler execution
    pub use josh_handler::{EventHandlerAction, HandlerError, Op, Scope};

    // Shadowing resolution
    pub use josh_shadow::{MetaHandle, MetaShadow, PriorView, ShadowingEntity, SpatialSupport};

    // Bridge
    pub use josh_bridge::{BridgeError, ConfigSource, EngineBridge, MapConfigSource, Replicate};

    // Engine
    pub use josh_engine::{StepError, StepMetrics, Stepper, StepperConfig};

    // Export
    pub use josh_export::{ExportError, ExportFacade, ExportSink, FrozenSnapshot};

    // Facade
    pub use crate::JoshError;
}
