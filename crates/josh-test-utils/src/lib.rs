//! Test fixtures and mock prototype builders for Josh development.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod fixtures;

pub use builder::{grid_fixture, PrototypeBuilder};
pub use fixtures::{const_attribute, failing_attribute, handler_for_event, identity_attribute};
