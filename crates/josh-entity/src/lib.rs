//! Entity model for the Josh simulation engine: mutable attribute
//! storage, prototype declarations, and immutable snapshots.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod entity;
pub mod frozen;
pub mod prototype;

pub use entity::Entity;
pub use frozen::FrozenEntity;
pub use prototype::{EventHandlers, Prototype};
