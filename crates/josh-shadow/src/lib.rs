//! Shadowing entity resolution for the Josh simulation engine:
//! per-step memoized attribute resolution and synthetic scope access
//! (`current`, `prior`, `here`, `meta`, `parent`, `geoKey`).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod entity_shadow;
pub mod meta;
pub mod outcome;
pub mod prior;
pub mod support;

pub use entity_shadow::ShadowingEntity;
pub use meta::{MetaHandle, MetaShadow};
pub use outcome::ResolveOutcome;
pub use prior::PriorView;
pub use support::SpatialSupport;
