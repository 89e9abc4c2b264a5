//! The export facade for the Josh simulation engine: bounded per-sink
//! writer queues and at-most-once-per-(step, entity-type) dispatch
//! (`spec.md` §4.I).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod facade;
pub mod sink;
pub mod snapshot;

pub use error::ExportError;
pub use facade::ExportFacade;
pub use sink::ExportSink;
pub use snapshot::FrozenSnapshot;
