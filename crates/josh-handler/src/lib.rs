//! Compiled event handlers for the Josh simulation engine.
//!
//! Implements `spec.md` §4.D: each attribute's right-hand side is compiled
//! to an [`EventHandlerAction`] — either a flat op stream run by
//! [`EventHandlerMachine`], or an `if`/`elif`/`else` chain built with
//! [`ConditionalBuilder`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod conditional;
pub mod error;
pub mod machine;
pub mod ops;
pub mod scope;

pub use conditional::{ConditionalAction, ConditionalBuilder, EventHandlerAction};
pub use error::HandlerError;
pub use machine::EventHandlerMachine;
pub use ops::{MapMethod, Op};
pub use scope::Scope;
