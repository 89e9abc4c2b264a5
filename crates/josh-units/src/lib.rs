//! Units and typed value algebra for the Josh simulation engine.
//!
//! Implements `spec.md` §4.A: a canonical product-of-base-unit-powers
//! [`Units`] type with alias-aware equality and declared conversions, and a
//! [`Value`] sum type carrying int/decimal/double/boolean/string/entity/
//! distribution payloads, every one of them unit-bearing.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod distribution;
pub mod error;
pub mod units;
pub mod value;

pub use distribution::{Distribution, Sampler};
pub use error::UnitsError;
pub use units::{UnitRegistry, Units};
pub use value::{EntityRef, Value};
