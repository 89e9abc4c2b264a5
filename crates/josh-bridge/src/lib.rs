//! The engine bridge: per-replicate patch/organism storage, the
//! spatial-query cache, configuration lookup, and precomputed-grid
//! loading for the Josh simulation engine (`spec.md` §4.E-§4.G).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine_bridge;
pub mod error;
pub mod grid_loader;
pub mod query_cache;
pub mod replicate;

pub use config::{ConfigSource, ConfigValue, MapConfigSource};
pub use engine_bridge::EngineBridge;
pub use error::BridgeError;
pub use grid_loader::{InputGetterStrategy, MapInputGetter, PrecomputedGridLoader};
pub use query_cache::{QueryCache, QueryFingerprint};
pub use replicate::Replicate;
